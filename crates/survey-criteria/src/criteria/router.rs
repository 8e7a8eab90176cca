use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::decode::CriteriaDocument;
use super::domain::{CriteriaSetId, ResponseSet};
use super::repository::{CriteriaSetRepository, CriteriaSetSummary, EvaluationLog, RepositoryError};
use super::service::{CriteriaService, CriteriaServiceError};

/// Body of an evaluation request against a stored criteria set.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[serde(default)]
    pub respondent_id: Option<String>,
    #[serde(default)]
    pub responses: ResponseSet,
}

/// Body of an ad-hoc evaluation of an unsaved criteria document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCriteriaRequest {
    pub criteria_set: CriteriaDocument,
    #[serde(default)]
    pub responses: ResponseSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationRequest {
    pub is_active: bool,
}

/// Router builder exposing HTTP endpoints for criteria management and evaluation.
pub fn criteria_router<R, L>(service: Arc<CriteriaService<R, L>>) -> Router
where
    R: CriteriaSetRepository + 'static,
    L: EvaluationLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/criteria-sets",
            post(create_handler::<R, L>).get(list_handler::<R, L>),
        )
        .route("/api/v1/criteria-sets/:set_id", get(fetch_handler::<R, L>))
        .route(
            "/api/v1/criteria-sets/:set_id/active",
            put(activation_handler::<R, L>),
        )
        .route(
            "/api/v1/criteria-sets/:set_id/evaluate",
            post(evaluate_handler::<R, L>),
        )
        .route("/api/v1/criteria/test", post(test_handler::<R, L>))
        .with_state(service)
}

pub(crate) async fn create_handler<R, L>(
    State(service): State<Arc<CriteriaService<R, L>>>,
    Json(document): Json<CriteriaDocument>,
) -> Response
where
    R: CriteriaSetRepository + 'static,
    L: EvaluationLog + 'static,
{
    match service.create(document) {
        Ok(set) => (StatusCode::CREATED, Json(set)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, L>(
    State(service): State<Arc<CriteriaService<R, L>>>,
) -> Response
where
    R: CriteriaSetRepository + 'static,
    L: EvaluationLog + 'static,
{
    match service.list_active() {
        Ok(sets) => {
            let summaries: Vec<CriteriaSetSummary> =
                sets.iter().map(CriteriaSetSummary::from).collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn fetch_handler<R, L>(
    State(service): State<Arc<CriteriaService<R, L>>>,
    Path(set_id): Path<String>,
) -> Response
where
    R: CriteriaSetRepository + 'static,
    L: EvaluationLog + 'static,
{
    match service.get(&CriteriaSetId(set_id)) {
        Ok(set) => (StatusCode::OK, Json(set)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn activation_handler<R, L>(
    State(service): State<Arc<CriteriaService<R, L>>>,
    Path(set_id): Path<String>,
    Json(request): Json<ActivationRequest>,
) -> Response
where
    R: CriteriaSetRepository + 'static,
    L: EvaluationLog + 'static,
{
    match service.set_active(&CriteriaSetId(set_id), request.is_active) {
        Ok(set) => (StatusCode::OK, Json(CriteriaSetSummary::from(&set))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn evaluate_handler<R, L>(
    State(service): State<Arc<CriteriaService<R, L>>>,
    Path(set_id): Path<String>,
    Json(request): Json<EvaluateRequest>,
) -> Response
where
    R: CriteriaSetRepository + 'static,
    L: EvaluationLog + 'static,
{
    let EvaluateRequest {
        respondent_id,
        responses,
    } = request;

    match service.evaluate(&CriteriaSetId(set_id), respondent_id, &responses) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn test_handler<R, L>(
    State(service): State<Arc<CriteriaService<R, L>>>,
    Json(request): Json<TestCriteriaRequest>,
) -> Response
where
    R: CriteriaSetRepository + 'static,
    L: EvaluationLog + 'static,
{
    match service.test(request.criteria_set, &request.responses) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: CriteriaServiceError) -> Response {
    let (status, kind) = match &err {
        CriteriaServiceError::Configuration(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "configuration_error")
        }
        CriteriaServiceError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, "not_found")
        }
        CriteriaServiceError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, "conflict")
        }
        CriteriaServiceError::Inactive(_) => (StatusCode::CONFLICT, "inactive"),
        CriteriaServiceError::Repository(RepositoryError::Unavailable(_))
        | CriteriaServiceError::Log(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };

    let payload = json!({
        "error": err.to_string(),
        "kind": kind,
    });
    (status, Json(payload)).into_response()
}
