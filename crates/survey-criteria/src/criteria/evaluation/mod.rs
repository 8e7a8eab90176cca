mod conditions;
mod strategy;

use serde::{Deserialize, Serialize};

use super::domain::{CriteriaSet, CriterionId, LogicType, ResponseSet};

#[cfg(test)]
pub(crate) use conditions::condition_holds;

/// Raised when a criteria set is too malformed to evaluate at all.
///
/// Distinct from a `fail` verdict: it means the rule set itself is broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("criteria set has no logic type configured")]
    MissingLogicType,
    #[error("unrecognized logic type '{0}'")]
    UnknownLogicType(String),
    #[error("passing threshold {0} is outside 0..=100")]
    ThresholdOutOfRange(i64),
    #[error("passing threshold {0} is not a number")]
    InvalidThreshold(String),
    #[error("criteria set is missing an id")]
    MissingCriteriaSetId,
    #[error("criterion id '{0}' appears more than once")]
    DuplicateCriterionId(String),
}

/// Overall verdict for a respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pass,
    Fail,
}

impl EvaluationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EvaluationStatus::Pass => "pass",
            EvaluationStatus::Fail => "fail",
        }
    }
}

/// Audit data describing how the verdict was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDetails {
    pub logic_type: LogicType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passing_threshold: Option<u8>,
    pub required_total: usize,
    pub required_met: usize,
    pub matched_weight: f64,
    pub total_weight: f64,
}

/// Evaluation output: verdict, score and the per-criterion trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub status: EvaluationStatus,
    pub score: u8,
    pub criteria_met: Vec<CriterionId>,
    pub criteria_failed: Vec<CriterionId>,
    pub message: String,
    pub details: EvaluationDetails,
}

impl EvaluationResult {
    pub fn passed(&self) -> bool {
        self.status == EvaluationStatus::Pass
    }

    pub fn summary(&self) -> String {
        format!("{} ({}%): {}", self.status.label(), self.score, self.message)
    }
}

/// Evaluate a respondent's answers against a criteria set.
///
/// Never fails on bad data inside the set or the answers; those degrade to
/// "does not match". Only an unset logic type is reported as an error.
pub fn evaluate(
    criteria_set: &CriteriaSet,
    responses: &ResponseSet,
) -> Result<EvaluationResult, ConfigurationError> {
    let logic_type = criteria_set
        .logic_type
        .ok_or(ConfigurationError::MissingLogicType)?;

    let mut tally = strategy::Tally::default();
    let mut criteria_met = Vec::new();
    let mut criteria_failed = Vec::new();

    for criterion in &criteria_set.criteria {
        let matched = conditions::criterion_matches(criterion, responses);
        tally.record(criterion, matched);
        if matched {
            criteria_met.push(criterion.id.clone());
        } else {
            criteria_failed.push(criterion.id.clone());
        }
    }

    let verdict = strategy::decide(logic_type, criteria_set.passing_threshold, &tally);
    let details = strategy::details(logic_type, criteria_set.passing_threshold, &tally);

    Ok(EvaluationResult {
        status: if verdict.passed {
            EvaluationStatus::Pass
        } else {
            EvaluationStatus::Fail
        },
        score: verdict.score,
        criteria_met,
        criteria_failed,
        message: verdict.message,
        details,
    })
}
