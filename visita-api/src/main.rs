use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use visita_api::adapters::{InProcessTicketAdapter, LoggingInvoiceAdapter};
use visita_api::{app, worker, AppState};
use visita_booking::AdmissionService;
use visita_store::{Config, DbClient, PgAdmissionStore, PgCustomerDirectory};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visita_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Visita API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Table rows override the file/env defaults
    let business_rules = match db.fetch_business_rules(config.business_rules.clone()).await {
        Ok(rules) => rules,
        Err(e) => {
            tracing::warn!("Failed to load business rules from DB, using defaults: {}", e);
            config.business_rules.clone()
        }
    };
    tracing::info!(
        lock_timeout_ms = business_rules.lock_timeout_ms,
        overlap_release = business_rules.overlap_release,
        "Business rules loaded"
    );

    let store = Arc::new(PgAdmissionStore::new(db.pool.clone(), business_rules.clone()));
    let directory = Arc::new(PgCustomerDirectory::new(db.pool.clone()));
    let admissions = AdmissionService::new(
        store,
        Arc::new(LoggingInvoiceAdapter),
        Arc::new(InProcessTicketAdapter::default()),
    );

    // SSE broadcast channel for live availability
    let (sse_tx, _) = tokio::sync::broadcast::channel(100);

    // Exhaustion notice delivery queue + worker
    let (notice_tx, notice_rx) = tokio::sync::mpsc::channel(100);
    tokio::spawn(worker::start_notice_worker(notice_rx));

    let app_state = AppState {
        admissions,
        directory,
        sse_tx,
        notice_tx,
        business_rules,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
