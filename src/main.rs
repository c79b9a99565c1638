use anyhow::Context;
use ledger::{
    api::routes::create_router,
    cli::{Cli, Commands},
    AppState, LedgerConfig,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();

    let config = LedgerConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let default_level = if cli.verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("invalid log level")?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.command == Some(Commands::CheckConfig) {
        info!(path = %cli.config.display(), "configuration is valid");
        return Ok(());
    }

    let addr = config.bind_address();
    let state = AppState::from_config(config)
        .await
        .context("failed to initialize application state")?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "ledger server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
