//! panelcheck server — dashboard validation over HTTP with hot-reloaded
//! panel schemas.

mod api;
mod router;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use panelcheck_core::Config;
use panelcheck_schema::{SchemaRegistry, SchemaWatcher};

/// Dashboard validation service with hot-reloaded panel schemas.
#[derive(Parser, Debug)]
#[command(name = "panelcheck-server", version, about)]
struct Cli {
    /// Directory containing one JSON schema file per panel kind.
    #[arg(long)]
    schemas_dir: Option<PathBuf>,

    /// Address to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    panelcheck_core::config::load_dotenv();
    let mut config = Config::from_env();

    let cli = Cli::parse();
    if let Some(dir) = cli.schemas_dir {
        config.schemas.dir = dir;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // An unreadable schema directory at startup is fatal; at runtime the
    // watcher absorbs reload failures and the last snapshot keeps serving.
    let registry = Arc::new(SchemaRegistry::open(config.schemas.dir.clone())?);
    info!(
        kinds = registry.current().len(),
        dir = %config.schemas.dir.display(),
        "schema registry ready"
    );

    let watcher = match SchemaWatcher::spawn(registry.clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!(error = %e, "schema watcher unavailable, serving without hot-reload");
            None
        }
    };

    let state = Arc::new(state::AppState::new(registry));
    let app = router::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    if let Some(watcher) = watcher {
        watcher.shutdown().await;
    }
    Ok(())
}
