use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryChildStore, InMemoryDocumentStore, InMemoryGuardianStore,
    InMemoryRegisterStore, OpaqueTokens,
};
use crate::routes::operational_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use childminder::config::AppConfig;
use childminder::error::AppError;
use childminder::notify::SmtpNotifier;
use childminder::telemetry;
use childminder::workflows::accounts::{accounts_router, AccountsService};
use childminder::workflows::attendance::{attendance_router, AttendanceService};
use childminder::workflows::contact::{contact_router, ContactService};
use childminder::workflows::documents::{documents_router, DocumentService};
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

    let guardians = Arc::new(InMemoryGuardianStore::default());
    let children = Arc::new(InMemoryChildStore::default());
    let documents = Arc::new(InMemoryDocumentStore::default());
    let register = Arc::new(InMemoryRegisterStore::default());
    let notifier = Arc::new(SmtpNotifier::new(config.mail.clone()));
    let tokens = Arc::new(OpaqueTokens::default());

    let accounts_service = Arc::new(AccountsService::new(
        guardians.clone(),
        children.clone(),
        notifier.clone(),
        tokens,
        config.business.clone(),
    ));
    let document_service = Arc::new(DocumentService::new(
        documents,
        children.clone(),
        guardians,
        notifier.clone(),
        config.business.clone(),
    ));
    let attendance_service = Arc::new(AttendanceService::new(register, children));
    let contact_service = Arc::new(ContactService::new(notifier, config.business.clone()));

    let app = accounts_router(accounts_service)
        .merge(documents_router(document_service))
        .merge(attendance_router(attendance_service))
        .merge(contact_router(contact_service))
        .merge(operational_router())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "childminding setting service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
