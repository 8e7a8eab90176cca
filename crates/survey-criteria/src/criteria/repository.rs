use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CriteriaSet, CriteriaSetId};
use super::evaluation::EvaluationResult;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait CriteriaSetRepository: Send + Sync {
    fn insert(&self, set: CriteriaSet) -> Result<CriteriaSet, RepositoryError>;
    fn update(&self, set: CriteriaSet) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &CriteriaSetId) -> Result<Option<CriteriaSet>, RepositoryError>;
    fn list(&self) -> Result<Vec<CriteriaSet>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook receiving every stored-set evaluation, e.g. to drive
/// redirects or postbacks downstream.
pub trait EvaluationLog: Send + Sync {
    fn record(&self, entry: EvaluationRecord) -> Result<(), EvaluationLogError>;
}

/// Evaluation outcome tagged with what was evaluated and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub criteria_set_id: CriteriaSetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respondent_id: Option<String>,
    pub result: EvaluationResult,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationLogError {
    #[error("evaluation log unavailable: {0}")]
    Transport(String),
}

/// Public listing entry for a stored criteria set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaSetSummary {
    pub id: CriteriaSetId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logic_type: Option<&'static str>,
    pub criteria_count: usize,
    pub is_active: bool,
}

impl From<&CriteriaSet> for CriteriaSetSummary {
    fn from(set: &CriteriaSet) -> Self {
        Self {
            id: set.id.clone(),
            name: set.name.clone(),
            logic_type: set.logic_type.map(|logic_type| logic_type.label()),
            criteria_count: set.criteria.len(),
            is_active: set.is_active,
        }
    }
}
