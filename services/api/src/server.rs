use crate::cli::ServeArgs;
use crate::infra::{
    seed_repository, AppState, InMemoryCriteriaSetRepository, InMemoryEvaluationLog,
};
use crate::routes::with_criteria_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use survey_criteria::config::AppConfig;
use survey_criteria::criteria::CriteriaService;
use survey_criteria::error::AppError;
use survey_criteria::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(seed) = args.seed.take() {
        config.criteria.seed_path = Some(seed);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryCriteriaSetRepository::default());
    if let Some(path) = config.criteria.seed_path.as_deref() {
        seed_repository(repository.as_ref(), path)?;
    }
    let log = Arc::new(InMemoryEvaluationLog::with_capacity(
        config.criteria.evaluation_log_capacity,
    ));
    let criteria_service = Arc::new(CriteriaService::new(repository, log));

    let app = with_criteria_routes(criteria_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "survey criteria service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
