//! finance-gateway server entry point.
//!
//! Loads configuration, wires the stores and the scheduler client, and
//! starts the Axum HTTP server.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use finance_gateway::api;
use finance_gateway::app_state::{AppState, Backends};
use finance_gateway::config::{GatewayConfig, LogFormat};
use finance_gateway::persistence::{
    ExpenseStore, MemoryStore, PostgresStore, RegularPaymentStore,
};
use finance_gateway::scheduler::{HttpJobScheduler, InMemoryScheduler, JobScheduler};
use finance_gateway::service::MonthlySweep;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting finance-gateway");

    if config.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; every /api/v1 request will be rejected");
    }

    // Build persistence and scheduler backends
    let scheduler = build_scheduler(&config)?;
    let backends = build_backends(&config, scheduler).await?;

    // Build application state
    let app_state = AppState::new(backends, config.callback_settings(), &config.jwt_secret);

    if config.sweep_enabled {
        let _sweep = MonthlySweep::new(app_state.regular_payments.clone()).spawn();
        tracing::info!("monthly sweep enabled");
    }

    // Build router
    let app = api::build_router(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Wires the stores selected by `PERSISTENCE_ENABLED` around `scheduler`.
async fn build_backends(
    config: &GatewayConfig,
    scheduler: Arc<dyn JobScheduler>,
) -> anyhow::Result<Backends> {
    if !config.persistence_enabled {
        tracing::warn!("persistence disabled; data is kept in memory only");
        let store = Arc::new(MemoryStore::new());
        return Ok(Backends {
            regular_payments: Arc::clone(&store) as Arc<dyn RegularPaymentStore>,
            expenses: Arc::clone(&store) as Arc<dyn ExpenseStore>,
            customers: store,
            scheduler,
        });
    }

    let store = Arc::new(PostgresStore::connect(config).await?);
    if config.run_migrations {
        store.migrate().await?;
        tracing::info!("database migrations applied");
    }
    Ok(Backends {
        regular_payments: Arc::clone(&store) as Arc<dyn RegularPaymentStore>,
        expenses: Arc::clone(&store) as Arc<dyn ExpenseStore>,
        customers: store,
        scheduler,
    })
}

fn build_scheduler(config: &GatewayConfig) -> anyhow::Result<Arc<dyn JobScheduler>> {
    if !config.scheduler_enabled {
        tracing::warn!("external scheduler disabled; jobs are kept in memory and never fire");
        return Ok(Arc::new(InMemoryScheduler::new()));
    }
    let client = HttpJobScheduler::new(
        &config.scheduler_base_url,
        config.scheduler_api_key.clone(),
        config.scheduler_retries,
        config.scheduler_retry_delay(),
        config.scheduler_timeout(),
    )?;
    tracing::info!(base_url = %config.scheduler_base_url, "external scheduler configured");
    Ok(Arc::new(client))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
