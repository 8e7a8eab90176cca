use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::criteria::decode::CriteriaDocument;
use crate::criteria::domain::{
    Condition, CriteriaSet, CriteriaSetId, Criterion, CriterionId, ExpectedValue, LogicType,
};
use crate::criteria::repository::{
    CriteriaSetRepository, EvaluationLog, EvaluationLogError, EvaluationRecord, RepositoryError,
};
use crate::criteria::{criteria_router, CriteriaService};

pub(super) fn criterion(
    id: &str,
    question_id: &str,
    condition: Condition,
    expected_value: ExpectedValue,
) -> Criterion {
    Criterion {
        id: CriterionId(id.to_string()),
        question_id: question_id.to_string(),
        condition,
        expected_value,
        required: false,
        weight: 1.0,
        description: String::new(),
    }
}

pub(super) fn required(mut criterion: Criterion) -> Criterion {
    criterion.required = true;
    criterion
}

pub(super) fn weighted(mut criterion: Criterion, weight: f64) -> Criterion {
    criterion.weight = weight;
    criterion
}

pub(super) fn criteria_set(
    logic_type: LogicType,
    passing_threshold: u8,
    criteria: Vec<Criterion>,
) -> CriteriaSet {
    CriteriaSet {
        id: CriteriaSetId("set-screener".to_string()),
        name: "Panel screener".to_string(),
        description: "Qualifies respondents for the main survey".to_string(),
        logic_type: Some(logic_type),
        passing_threshold,
        criteria,
        is_active: true,
        created_at: None,
        updated_at: None,
    }
}

pub(super) fn ids(values: &[&str]) -> Vec<CriterionId> {
    values
        .iter()
        .map(|value| CriterionId(value.to_string()))
        .collect()
}

pub(super) fn screener_document_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Adult homeowners",
        "logicType": "all_required",
        "passingThreshold": 0,
        "isActive": true,
        "criteria": [
            {
                "id": "c-age",
                "questionId": "age",
                "condition": "greater_than_or_equal",
                "expectedValue": "18",
                "required": true,
                "weight": 1
            },
            {
                "id": "c-owner",
                "questionId": "owns_home",
                "condition": "equals",
                "expectedValue": "Yes",
                "required": true,
                "weight": 1
            }
        ]
    })
}

pub(super) fn screener_document(id: &str) -> CriteriaDocument {
    serde_json::from_value(screener_document_json(id)).expect("valid criteria document")
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) sets: Arc<Mutex<HashMap<CriteriaSetId, CriteriaSet>>>,
}

impl CriteriaSetRepository for MemoryRepository {
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
        guard.insert(set.id.clone(), set);
        Ok(())
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

#[derive(Default, Clone)]
pub(super) struct MemoryLog {
    entries: Arc<Mutex<Vec<EvaluationRecord>>>,
}

impl MemoryLog {
    pub(super) fn entries(&self) -> Vec<EvaluationRecord> {
        self.entries.lock().expect("log mutex poisoned").clone()
    }
}

impl EvaluationLog for MemoryLog {
    fn record(&self, entry: EvaluationRecord) -> Result<(), EvaluationLogError> {
        self.entries
            .lock()
            .expect("log mutex poisoned")
            .push(entry);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl CriteriaSetRepository for UnavailableRepository {
    fn insert(&self, _set: CriteriaSet) -> Result<CriteriaSet, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _set: CriteriaSet) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &CriteriaSetId) -> Result<Option<CriteriaSet>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<CriteriaSet>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct FailingLog;

impl EvaluationLog for FailingLog {
    fn record(&self, _entry: EvaluationRecord) -> Result<(), EvaluationLogError> {
        Err(EvaluationLogError::Transport("queue closed".to_string()))
    }
}

pub(super) fn build_service() -> (
    CriteriaService<MemoryRepository, MemoryLog>,
    Arc<MemoryRepository>,
    Arc<MemoryLog>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let log = Arc::new(MemoryLog::default());
    let service = CriteriaService::new(repository.clone(), log.clone());
    (service, repository, log)
}

pub(super) fn router_with_service(
    service: CriteriaService<MemoryRepository, MemoryLog>,
) -> axum::Router {
    criteria_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
