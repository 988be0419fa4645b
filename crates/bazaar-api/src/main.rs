//! Bazaar API server entry point.

use std::sync::{Arc, Mutex};

use bazaar_api::config::AppConfig;
use bazaar_api::error::AppError;
use bazaar_api::routes;
use bazaar_api::state::{AppState, Collaborators, MarketplaceSettings};
use bazaar_api::telemetry::Telemetry;
use bazaar_core::clock::SystemClock;
use bazaar_core::rng::SystemRng;
use bazaar_event_store::pg_catalog::{PgProductCatalog, PgVendorDirectory};
use bazaar_event_store::pg_event_repository::PgEventRepository;
use bazaar_event_store::pg_side_effect_ledger::PgSideEffectLedger;
use bazaar_event_store::schema::run_migrations;
use bazaar_notifications::dispatcher::SideEffectDispatcher;
use bazaar_notifications::sinks::{LoggingEmailSink, LoggingNotificationSink};
use bazaar_ordering::application::ports::HostedPagePaymentInitiator;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry = Telemetry::init(&config)?;

    tracing::info!(currency = %config.currency, "Starting Bazaar API server");

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    run_migrations(&pool).await?;

    // Build application state.
    let vendors = Arc::new(PgVendorDirectory::new(pool.clone()));
    let dispatcher = SideEffectDispatcher::new(
        Arc::new(PgSideEffectLedger::new(pool.clone())),
        Arc::new(LoggingNotificationSink),
        Arc::new(LoggingEmailSink),
        vendors.clone(),
    );
    let collaborators = Collaborators {
        catalog: Arc::new(PgProductCatalog::new(pool.clone())),
        vendors,
        payments: Arc::new(HostedPagePaymentInitiator::new(
            config.payment_redirect_base_url.clone(),
        )),
        dispatcher,
    };
    let settings = MarketplaceSettings {
        quote: config.quote_settings(),
        vat_rate_percent: config.vat_rate_percent,
    };
    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(Mutex::new(SystemRng::from_entropy())),
        Arc::new(PgEventRepository::new(pool)),
        collaborators,
        settings,
    );

    // Start server.
    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, routes::app(app_state)).await;

    telemetry.shutdown();
    served?;

    Ok(())
}
