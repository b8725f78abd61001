use std::sync::Arc;

use highvocab_config::Config;
use tokio::sync::RwLock;

use crate::storage::FileStore;

pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub store: Arc<FileStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(FileStore::new(config.storage.path.clone()));
        Self {
            config: Arc::new(RwLock::new(config)),
            store,
        }
    }
}
