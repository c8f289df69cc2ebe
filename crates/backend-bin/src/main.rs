use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use backend_lib::{
    config::Settings,
    directory::MemoryDirectory,
    router,
    AppState,
};

/// Gatehouse authentication server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    if settings.providers.is_empty() {
        tracing::warn!("no OAuth providers configured; provider sign-in is disabled");
    }

    // Create the principal directory and application state
    let directory = MemoryDirectory::new();
    let state = Arc::new(AppState::new(directory, settings.clone()));

    // Create the router
    let app = router::create_router(state);

    // Start the server
    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
