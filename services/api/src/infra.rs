use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use survey_criteria::config::DEFAULT_EVALUATION_LOG_CAPACITY;
use survey_criteria::criteria::{
    decode_criteria_sets, CriteriaSet, CriteriaSetId, CriteriaSetRepository, CriteriaServiceError,
    EvaluationLog, EvaluationLogError, EvaluationRecord, RepositoryError,
};
use survey_criteria::error::AppError;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCriteriaSetRepository {
    sets: Arc<Mutex<HashMap<CriteriaSetId, CriteriaSet>>>,
}

impl CriteriaSetRepository for InMemoryCriteriaSetRepository {
    fn insert(&self, set: CriteriaSet) -> Result<CriteriaSet, RepositoryError> {
        let mut guard = self.sets.lock().expect("repository mutex poisoned");
        if guard.contains_key(&set.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(set.id.clone(), set.clone());
        Ok(set)
    }

    fn update(&self, set: CriteriaSet) -> Result<(), RepositoryError> {
        let mut guard = self.sets.lock().expect("repository mutex poisoned");
        if guard.contains_key(&set.id) {
            guard.insert(set.id.clone(), set);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &CriteriaSetId) -> Result<Option<CriteriaSet>, RepositoryError> {
        let guard = self.sets.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<CriteriaSet>, RepositoryError> {
        let guard = self.sets.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// Keeps the most recent evaluation records, dropping the oldest once full.
#[derive(Clone)]
pub(crate) struct InMemoryEvaluationLog {
    records: Arc<Mutex<VecDeque<EvaluationRecord>>>,
    capacity: usize,
}

impl InMemoryEvaluationLog {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(1_024)))),
            capacity,
        }
    }

    #[cfg(test)]
    pub(crate) fn records(&self) -> Vec<EvaluationRecord> {
        self.records
            .lock()
            .expect("evaluation log mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

impl Default for InMemoryEvaluationLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVALUATION_LOG_CAPACITY)
    }
}

impl EvaluationLog for InMemoryEvaluationLog {
    fn record(&self, entry: EvaluationRecord) -> Result<(), EvaluationLogError> {
        let mut guard = self.records.lock().expect("evaluation log mutex poisoned");
        while guard.len() >= self.capacity {
            guard.pop_front();
        }
        guard.push_back(entry);
        Ok(())
    }
}

/// Loads a JSON array of criteria documents into the repository.
///
/// Sets without a logic type are skipped with a warning so one bad document
/// does not block startup. Duplicate ids abort the load.
pub(crate) fn seed_repository<R>(repository: &R, path: &Path) -> Result<usize, AppError>
where
    R: CriteriaSetRepository,
{
    let raw = std::fs::read_to_string(path)?;
    let sets = decode_criteria_sets(&raw)?;
    let now = Utc::now();

    let mut loaded = 0;
    for mut set in sets {
        if set.logic_type.is_none() {
            warn!(criteria_set = %set.id, "seed criteria set has no logic type; skipping");
            continue;
        }
        set.created_at = Some(set.created_at.unwrap_or(now));
        set.updated_at = Some(set.updated_at.unwrap_or(now));
        repository
            .insert(set)
            .map_err(CriteriaServiceError::from)?;
        loaded += 1;
    }

    info!(path = %path.display(), loaded, "criteria seed loaded");
    Ok(loaded)
}
