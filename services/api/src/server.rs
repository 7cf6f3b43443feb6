use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryMatchingStore, LogAlertPublisher};
use crate::routes::with_matching_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dealscout::config::AppConfig;
use dealscout::error::AppError;
use dealscout::telemetry;
use dealscout::workflows::matching::{MatchingService, ScoringConfig};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryMatchingStore::default());
    let alerts = Arc::new(LogAlertPublisher);
    let scoring = ScoringConfig::default().with_min_score(config.matching.min_match_score);
    let matching_service = Arc::new(MatchingService::new(store, alerts, scoring));

    let app = with_matching_routes(matching_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "deal matching engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
