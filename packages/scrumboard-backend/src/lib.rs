/// Scrumboard Backend: config loading, storage init, HTTP server.
pub mod api;
pub mod config;
pub mod error;
pub mod log_bridge;
pub mod server;
pub mod state;

use crate::error::ServerError;
use crate::state::AppState;
use scrumboard_core::service::InMemoryStoryService;
use scrumboard_core::storage::file::FileStore;
use scrumboard_core::storage::KeyValueStore;
use std::sync::Arc;

pub async fn run() -> Result<(), ServerError> {
    if let Err(e) = log_bridge::init() {
        eprintln!("failed to initialize backend logger: {}", e);
    }

    let config_path = config::default_config_path();
    let config = config::load_config(&config_path);
    let data_dir = config.data_dir();

    let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&data_dir)?);
    log::info!("Using data directory {}", data_dir.display());
    let stories = Arc::new(InMemoryStoryService::persistent(kv.clone()));

    let state = AppState::new(stories, kv, config.port, config.bind_address.clone());
    let port = server::spawn_server(state).await?;
    log::info!("Scrumboard backend ready on port {}", port);

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    Ok(())
}
