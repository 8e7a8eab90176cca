use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::decode::CriteriaDocument;
use super::domain::{CriteriaSet, CriteriaSetId, ResponseSet};
use super::evaluation::{evaluate, ConfigurationError, EvaluationResult};
use super::repository::{
    CriteriaSetRepository, EvaluationLog, EvaluationLogError, EvaluationRecord, RepositoryError,
};

/// Service composing criteria storage, the evaluator, and the evaluation log.
pub struct CriteriaService<R, L> {
    repository: Arc<R>,
    log: Arc<L>,
}

impl<R, L> CriteriaService<R, L>
where
    R: CriteriaSetRepository + 'static,
    L: EvaluationLog + 'static,
{
    pub fn new(repository: Arc<R>, log: Arc<L>) -> Self {
        Self { repository, log }
    }

    /// Validate and store a new criteria set.
    pub fn create(&self, document: CriteriaDocument) -> Result<CriteriaSet, CriteriaServiceError> {
        let mut set = document.into_criteria_set()?;
        if set.logic_type.is_none() {
            return Err(ConfigurationError::MissingLogicType.into());
        }

        let now = Utc::now();
        set.created_at = Some(set.created_at.unwrap_or(now));
        set.updated_at = Some(now);

        let stored = self.repository.insert(set)?;
        info!(
            criteria_set = %stored.id,
            criteria = stored.criteria.len(),
            "criteria set stored"
        );
        Ok(stored)
    }

    /// Fetch a stored criteria set.
    pub fn get(&self, id: &CriteriaSetId) -> Result<CriteriaSet, CriteriaServiceError> {
        let set = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(set)
    }

    /// Criteria sets that may currently be selected for evaluation.
    pub fn list_active(&self) -> Result<Vec<CriteriaSet>, CriteriaServiceError> {
        let mut sets: Vec<CriteriaSet> = self
            .repository
            .list()?
            .into_iter()
            .filter(|set| set.is_active)
            .collect();
        sets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sets)
    }

    /// Enable or retire a stored set without touching its criteria.
    pub fn set_active(
        &self,
        id: &CriteriaSetId,
        is_active: bool,
    ) -> Result<CriteriaSet, CriteriaServiceError> {
        let mut set = self.get(id)?;
        set.is_active = is_active;
        set.updated_at = Some(Utc::now());
        self.repository.update(set.clone())?;
        info!(criteria_set = %set.id, is_active, "criteria set activation changed");
        Ok(set)
    }

    /// Evaluate a respondent against a stored, active criteria set and log the outcome.
    pub fn evaluate(
        &self,
        id: &CriteriaSetId,
        respondent_id: Option<String>,
        responses: &ResponseSet,
    ) -> Result<EvaluationResult, CriteriaServiceError> {
        let set = self.get(id)?;
        if !set.is_active {
            return Err(CriteriaServiceError::Inactive(set.id));
        }

        let result = evaluate(&set, responses).inspect_err(|err| {
            warn!(criteria_set = %set.id, error = %err, "criteria set cannot be evaluated");
        })?;

        let unsupported = set
            .criteria
            .iter()
            .filter(|criterion| !criterion.condition.is_supported())
            .count();
        if unsupported > 0 {
            debug!(
                criteria_set = %set.id,
                unsupported,
                "unsupported conditions evaluated as non-matching"
            );
        }

        info!(
            criteria_set = %set.id,
            respondent = respondent_id.as_deref().unwrap_or("anonymous"),
            status = result.status.label(),
            score = result.score,
            "respondent evaluated"
        );

        self.log.record(EvaluationRecord {
            criteria_set_id: set.id,
            respondent_id,
            result: result.clone(),
            evaluated_at: Utc::now(),
        })?;

        Ok(result)
    }

    /// Evaluate an unsaved document, as the admin "test criteria" flow does.
    /// Activation is ignored and nothing is logged.
    pub fn test(
        &self,
        document: CriteriaDocument,
        responses: &ResponseSet,
    ) -> Result<EvaluationResult, CriteriaServiceError> {
        let set = document.into_criteria_set()?;
        let result = evaluate(&set, responses)?;
        debug!(criteria_set = %set.id, status = result.status.label(), "criteria test evaluated");
        Ok(result)
    }
}

/// Error raised by the criteria service.
#[derive(Debug, thiserror::Error)]
pub enum CriteriaServiceError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Log(#[from] EvaluationLogError),
    #[error("criteria set {0} is not active")]
    Inactive(CriteriaSetId),
}
