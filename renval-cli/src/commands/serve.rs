//! Run the renval HTTP server
//!
//! Wires the SQLite store, the filesystem artifact store, the JSON document
//! renderer and the HTTP message gateway into the core, then serves the API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use renval_core::collaborators::{FsArtifactStore, HttpDispatcher, JsonDocumentRenderer};
use renval_core::{Collaborators, MemoryEventBus, Renval};
use renval_server::{AppState, RenvalServer, ServerConfig};
use tracing::info;

use crate::commands::migrate::open_store;
use crate::config::{ConfigLoader, RenvalConfig};

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// SQLite database file (overrides config)
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Artifact directory (overrides config)
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,
}

impl ServeArgs {
    /// Command-line flags are the last configuration layer
    fn apply(self, mut config: RenvalConfig) -> RenvalConfig {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(database) = self.database {
            config.storage.database = database;
        }
        if let Some(dir) = self.artifacts_dir {
            config.storage.artifacts_dir = dir;
        }
        config
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.apply(ConfigLoader::load()?);
    let state = build_state(&config)?;

    info!(
        "Starting renval server on {}:{}",
        config.server.host, config.server.port
    );
    let server = RenvalServer::with_state(
        ServerConfig::new(config.server.host.clone(), config.server.port),
        Arc::new(state),
    );
    server.run().await.map_err(Into::into)
}

/// Open the store and construct the production collaborators
fn build_state(config: &RenvalConfig) -> Result<AppState> {
    let store = Arc::new(open_store(&config.storage.database)?);

    std::fs::create_dir_all(&config.storage.artifacts_dir).with_context(|| {
        format!(
            "Failed to create artifact directory {}",
            config.storage.artifacts_dir.display()
        )
    })?;
    let artifacts = Arc::new(FsArtifactStore::new(&config.storage.artifacts_dir));

    let renval = Renval::new(
        store,
        Collaborators {
            artifacts: artifacts.clone(),
            renderer: Arc::new(JsonDocumentRenderer::new(artifacts)),
            dispatcher: Arc::new(HttpDispatcher::new(config.invitation.endpoint.clone())),
            events: Arc::new(MemoryEventBus::default()),
        },
        config.core_config(),
    );
    Ok(AppState::new(renval))
}
