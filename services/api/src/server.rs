use crate::cli::ServeArgs;
use crate::infra::{renderer_for, AppState};
use crate::routes::with_enrollment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ffw_enrollment::config::AppConfig;
use ffw_enrollment::delivery::{DocumentMailer, SmtpMailer};
use ffw_enrollment::error::AppError;
use ffw_enrollment::submission::EnrollmentService;
use ffw_enrollment::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let mailer = SmtpMailer::from_config(&config.mail)?;
    if mailer.is_configured() {
        info!(
            recipient = mailer.recipient(),
            port = config.mail.smtp_port,
            "smtp delivery configured"
        );
    } else {
        warn!("mail settings incomplete, submissions will be rejected at delivery");
    }

    let renderer = renderer_for(&config.assets, None);
    let service = Arc::new(EnrollmentService::new(
        renderer,
        Arc::new(mailer),
        config.mail.timeout,
    ));

    let app = with_enrollment_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "enrollment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
