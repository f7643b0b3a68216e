use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use leadflow::config::AppConfig;
use leadflow::error::AppError;
use leadflow::leads::LeadService;
use leadflow::telemetry;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryCrmPublisher, InMemoryLeadRepository, InMemoryNotificationPublisher,
};
use crate::routes::with_lead_routes;

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

    let repository = Arc::new(InMemoryLeadRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let crm = Arc::new(InMemoryCrmPublisher::default());
    let lead_service = Arc::new(LeadService::new(repository, notifications, crm));

    let app = with_lead_routes(lead_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        admin_email = %config.smtp.admin_email,
        "lead capture service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
