pub mod directory;
pub mod settings;
pub mod tasks;

use crate::client::TfsClient;
use crate::error::{TrackerError, TrackerResult};
use crate::models::directory::DirectoryCache;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// State shared by every desktop command.
///
/// The HTTP client is built lazily from the current settings and dropped
/// whenever settings are saved, so the next call reconnects.
pub struct AppState {
    pub config_dir: PathBuf,
    pub directory: Arc<Mutex<DirectoryCache>>,
    client: Mutex<Option<Arc<TfsClient>>>,
}

impl AppState {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_dir,
            directory: Arc::new(Mutex::new(DirectoryCache::default())),
            client: Mutex::new(None),
        }
    }

    pub fn client(&self) -> TrackerResult<Arc<TfsClient>> {
        let mut slot = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let settings =
            settings::load_connection_settings(&self.config_dir).map_err(TrackerError::Config)?;
        let client = Arc::new(TfsClient::new(&settings)?);
        log::info!("Connected tracking client to {}", client.base_url());
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    pub fn reset_client(&self) {
        *self.client.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
