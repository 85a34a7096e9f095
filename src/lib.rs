pub mod api;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod genome;
pub mod report;
pub mod services;
pub mod traits;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Startup failed: {0}")]
    Core(#[from] core_state::CoreError),
    #[error("{0}")]
    Server(#[from] api::ServerError),
    #[error("Could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Load configuration from the environment and serve until Ctrl+C / SIGTERM.
pub fn run() -> Result<(), StartupError> {
    // A local .env fills in variables not already set
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    if let Ok(path) = &dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    let config = config::AppConfig::from_env()?;
    tracing::info!(?config, "Configuration loaded");
    let bind = config.bind;

    let core = Arc::new(core_state::CoreState::from_config(config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    // `core` outlives the runtime: the blocking HTTP clients inside it
    // must not be dropped on an async worker.
    runtime.block_on(api::serve(core.clone(), bind, api::shutdown_signal()))?;
    drop(runtime);
    drop(core);
    Ok(())
}
