pub mod accounts; // Sign-up, sign-in, sign-out
pub mod achievements; // Donor badges
pub mod api; // HTTP JSON API
pub mod authorization; // Admin role gate
pub mod compatibility; // Blood-type table
pub mod config;
pub mod core_state; // Shared state: store, sessions, notifier
pub mod crypto;
pub mod db;
pub mod donors; // Registration, profile, search, stats
pub mod error;
pub mod models;
pub mod navigation;
pub mod session;
pub mod urgent; // Urgent requests + advisory broadcast
pub mod validation;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::core_state::{CoreError, CoreState};
use crate::error::ServiceError;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Initialize tracing from `RUST_LOG`, falling back to the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Serve the API until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        "{} starting v{} on {}",
        config::APP_NAME,
        config::APP_VERSION,
        config.bind_addr
    );

    let core = Arc::new(CoreState::open(&config)?);
    let ctx = api::ApiContext::new(core).with_trusted_proxies(config.trusted_proxies.clone());
    let mut server = api::start_server(ctx, config.bind_addr).await?;

    tokio::signal::ctrl_c().await.map_err(RunError::Signal)?;
    server.shutdown();
    server.wait().await?;
    Ok(())
}

/// Grant the admin role to the account registered under `email`.
/// Roles have no HTTP path; this is the operator's way in.
pub fn grant_admin(email: &str) -> Result<(), RunError> {
    let config = AppConfig::from_env()?;
    let core = CoreState::open(&config)?;
    let conn = core.db()?;
    let account = accounts::promote_to_admin(&conn, email)?;
    tracing::info!(account_id = %account.id, "{email} is now an administrator");
    Ok(())
}
