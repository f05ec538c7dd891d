use crate::cli::ServeArgs;
use crate::infra::{seed_catalog, AppState};
use crate::routes::with_enrollment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use enrollment::config::AppConfig;
use enrollment::error::AppError;
use enrollment::registrations::{EnrollmentService, InMemoryEnrollmentStore};
use enrollment::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryEnrollmentStore::default());
    let service = EnrollmentService::new(store, config.grading);
    if args.seed {
        let catalog = seed_catalog(&service, Local::now().date_naive())?;
        info!(
            professor_id = %catalog.professor.id,
            student_id = %catalog.student.id,
            subject_id = %catalog.subject.id,
            sittings = catalog.sittings.len(),
            "sample catalog seeded"
        );
    }

    let app = with_enrollment_routes(Arc::new(service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        passing_grade = config.grading.passing_grade,
        "exam registration service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
