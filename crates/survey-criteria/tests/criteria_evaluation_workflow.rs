//! Integration scenarios for respondent qualification.
//!
//! Scenarios drive the public decode, import, service and router surfaces so the
//! evaluator is exercised the way an embedding service would use it.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use survey_criteria::criteria::{
        CriteriaService, CriteriaSet, CriteriaSetId, CriteriaSetRepository, EvaluationLog,
        EvaluationLogError, EvaluationRecord, RepositoryError,
    };

    pub(super) const PANEL_DOCUMENT: &str = r#"{
        "id": "panel-2026",
        "name": "Household panel",
        "description": "Adults in the northern regions who shop online",
        "logicType": "weighted_score",
        "passingThreshold": 70,
        "criteria": [
            { "id": "adult", "questionId": "age", "condition": "greater_than_or_equal",
              "expectedValue": 18, "required": true, "weight": 3 },
            { "id": "region", "questionId": "region", "condition": "in_list",
              "expectedValue": "north, north-east, north-west", "weight": 2 },
            { "id": "shops-online", "questionId": "shopping", "condition": "contains",
              "expectedValue": "online", "weight": 1 },
            { "id": "not-industry", "questionId": "employer", "condition": "not_equals",
              "expectedValue": "Market research", "weight": 1 }
        ]
    }"#;

    #[derive(Default, Clone)]
    pub(super) struct MemoryRepository {
        sets: Arc<Mutex<HashMap<CriteriaSetId, CriteriaSet>>>,
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
        records: Arc<Mutex<Vec<EvaluationRecord>>>,
    }

    impl MemoryLog {
        pub(super) fn records(&self) -> Vec<EvaluationRecord> {
            self.records.lock().expect("log mutex poisoned").clone()
        }
    }

    impl EvaluationLog for MemoryLog {
        fn record(&self, entry: EvaluationRecord) -> Result<(), EvaluationLogError> {
            self.records.lock().expect("log mutex poisoned").push(entry);
            Ok(())
        }
    }

    pub(super) fn build_service() -> (
        Arc<CriteriaService<MemoryRepository, MemoryLog>>,
        Arc<MemoryLog>,
    ) {
        let log = Arc::new(MemoryLog::default());
        let service = CriteriaService::new(Arc::new(MemoryRepository::default()), log.clone());
        (Arc::new(service), log)
    }
}

mod evaluation {
    use super::common::*;
    use survey_criteria::criteria::{
        decode_criteria_set, evaluate, CriterionId, EvaluationStatus, LogicType, ResponseSet,
    };

    fn ids(values: &[&str]) -> Vec<CriterionId> {
        values
            .iter()
            .map(|value| CriterionId(value.to_string()))
            .collect()
    }

    #[test]
    fn weighted_panel_admits_qualifying_respondent() {
        let set = decode_criteria_set(PANEL_DOCUMENT).expect("decodes");
        let responses = ResponseSet::new()
            .with("age", 34.0)
            .with("region", "North-East")
            .with("shopping", "Mostly online, sometimes in store")
            .with("employer", "Hospital");

        let result = evaluate(&set, &responses).expect("evaluates");

        assert_eq!(result.status, EvaluationStatus::Pass);
        assert_eq!(result.score, 100);
        assert_eq!(
            result.criteria_met,
            ids(&["adult", "region", "shops-online", "not-industry"])
        );
        assert!(result.criteria_failed.is_empty());
        assert_eq!(result.details.logic_type, LogicType::WeightedScore);
    }

    #[test]
    fn weighted_panel_scores_partial_matches_against_threshold() {
        let set = decode_criteria_set(PANEL_DOCUMENT).expect("decodes");
        let responses = ResponseSet::new()
            .with("age", "19")
            .with("region", "south")
            .with("shopping", "in store")
            .with("employer", "market research");

        let result = evaluate(&set, &responses).expect("evaluates");

        // 3 of 7 weight units.
        assert_eq!(result.score, 43);
        assert_eq!(result.status, EvaluationStatus::Fail);
        assert_eq!(
            result.criteria_failed,
            ids(&["region", "shops-online", "not-industry"])
        );
        assert!(result.message.contains("70"));
    }

    #[test]
    fn unanswered_questions_never_qualify() {
        let set = decode_criteria_set(PANEL_DOCUMENT).expect("decodes");

        let result = evaluate(&set, &ResponseSet::new()).expect("evaluates");

        assert_eq!(result.score, 0);
        assert_eq!(result.status, EvaluationStatus::Fail);
        assert_eq!(result.criteria_met.len() + result.criteria_failed.len(), 4);
    }
}

mod import {
    use super::common::*;
    use survey_criteria::criteria::{
        decode_criteria_set, evaluate, EvaluationStatus, ResponseBatchImporter,
    };

    #[test]
    fn csv_exports_feed_batch_evaluation() {
        let export = "\u{feff}Respondent_ID,age,region,shopping,employer\n\
                      r-100,45,north,online,Bakery\n\
                      r-101,16,north,online,Bakery\n\
                      ,30,west,,\n";

        let rows = ResponseBatchImporter::from_reader(export.as_bytes()).expect("imports");
        let set = decode_criteria_set(PANEL_DOCUMENT).expect("decodes");

        let outcomes: Vec<(String, EvaluationStatus)> = rows
            .iter()
            .map(|row| {
                let result = evaluate(&set, &row.responses).expect("evaluates");
                (row.respondent_id.clone(), result.status)
            })
            .collect();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], ("r-100".to_string(), EvaluationStatus::Pass));
        assert_eq!(outcomes[1].1, EvaluationStatus::Fail);
        assert_eq!(outcomes[2].0, "row-3");
        assert!(rows[2].responses.answer("shopping").is_none());
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use survey_criteria::criteria::criteria_router;
    use tower::ServiceExt;

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn stored_sets_evaluate_and_log_each_respondent() {
        let (service, log) = build_service();
        let router = criteria_router(service);
        let document: Value = serde_json::from_str(PANEL_DOCUMENT).expect("valid json");

        let created = router
            .clone()
            .oneshot(post("/api/v1/criteria-sets", document))
            .await
            .expect("router responds");
        assert_eq!(created.status(), StatusCode::CREATED);

        for (respondent, age) in [("r-1", 40), ("r-2", 12)] {
            let response = router
                .clone()
                .oneshot(post(
                    "/api/v1/criteria-sets/panel-2026/evaluate",
                    json!({
                        "respondentId": respondent,
                        "responses": { "age": age, "region": "north", "shopping": "online" }
                    }),
                ))
                .await
                .expect("router responds");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let fetched = router
            .oneshot(
                Request::get("/api/v1/criteria-sets/panel-2026")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(fetched.status(), StatusCode::OK);
        assert_eq!(body_json(fetched).await["passingThreshold"], 70);

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].result.passed());
        assert!(!records[1].result.passed());
        assert_eq!(records[1].respondent_id.as_deref(), Some("r-2"));
    }

    #[tokio::test]
    async fn test_endpoint_reports_configuration_problems() {
        let (service, log) = build_service();
        let router = criteria_router(service);

        let response = router
            .oneshot(post(
                "/api/v1/criteria/test",
                json!({
                    "criteriaSet": {
                        "id": "draft",
                        "logicType": "threshold_based",
                        "passingThreshold": 150,
                        "criteria": []
                    },
                    "responses": {}
                }),
            ))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "configuration_error");
        assert!(log.records().is_empty());
    }
}
