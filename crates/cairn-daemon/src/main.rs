//! cairn-daemon: the Cairn time capsule daemon.
//!
//! A single OS process on one Tokio runtime: a JSON-RPC server over a Unix
//! domain socket for clients, and the unlock scheduler that promotes due
//! capsules at each civil midnight. All state lives in the SQLite store
//! under the data directory.

mod auth;
mod commands;
mod config;
mod rpc;

use std::sync::Arc;

use tracing::{error, info};

use cairn_capsule::{CapsuleService, UnlockScheduler};
use cairn_render::blob::HttpBlobStore;
use cairn_render::tts::TtsClient;
use cairn_render::RenderCache;

use crate::config::DaemonConfig;
use crate::rpc::RpcServer;

/// Daemon-wide shared state, handed to every command handler.
pub struct DaemonState {
    /// Store handle shared with the capsule service.
    pub db: Arc<tokio::sync::Mutex<rusqlite::Connection>>,
    /// The capsule domain service.
    pub service: CapsuleService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config before anything else; the log level comes from it
    let config = DaemonConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("cairn={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("Cairn daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open the store
    let db_path = data_dir.join("cairn.db");
    let db = Arc::new(tokio::sync::Mutex::new(cairn_db::open(&db_path)?));
    info!("Store opened at {:?}", db_path);

    // 3. External render collaborators
    let renderer = Arc::new(TtsClient::new(config.tts_config())?);
    let blobs = Arc::new(HttpBlobStore::new(config.blob_config())?);
    let render = RenderCache::new(renderer, blobs);

    // 4. Domain service over the shared handle
    let service = CapsuleService::new(db.clone(), render);
    let state = Arc::new(DaemonState { db, service });

    // 5. Unlock scheduler runs on its own store connection so a slow RPC
    //    call can never delay the midnight sweep
    let scheduler_db = Arc::new(tokio::sync::Mutex::new(cairn_db::open(&db_path)?));
    let mut scheduler = UnlockScheduler::new(scheduler_db);
    scheduler.start();

    // 6. Serve RPC until interrupted
    let socket_path = data_dir.join("daemon.sock");
    let server = RpcServer::new(state, socket_path.clone());
    info!("Starting JSON-RPC server on {:?}", socket_path);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    scheduler.stop().await;
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
