use crate::cli::ServeArgs;
use crate::infra::{advice_pipeline, build_lending_service, AppState};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credi_index::config::AppConfig;
use credi_index::error::AppError;
use credi_index::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
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

    let (lending_service, _) = build_lending_service(&config.lending, None)?;
    let advice = advice_pipeline(&config.advice);
    let advice_analyst = advice.analyst_name();
    let advice_refiner = advice.refiner_name().unwrap_or("none");

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        lending: lending_service.clone(),
    };

    let app = with_service_routes(lending_service, advice)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        apr_model = %config.lending.apr_model,
        custom_table = config.lending.scoring_table.is_some(),
        advice_analyst,
        advice_refiner,
        "credibility index service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
