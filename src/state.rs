use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::services::{CategoryService, PartService, PlatformService};

/// Shared handler state. The store is injected once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn platforms(&self) -> PlatformService {
        PlatformService::new(self.store.clone())
    }

    pub fn parts(&self) -> PartService {
        PartService::new(self.store.clone())
    }

    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self.store.clone())
    }
}
