use std::sync::Arc;

use serde_json::{json, Value};

use crate::database::{MemoryStore, Store};
use crate::models::{PartDefinitionInput, PlatformInput};
use crate::services::{CategoryService, PartService, PlatformService};

/// Services wired to a fresh in-memory store.
pub struct TestContext {
    pub store: Arc<dyn Store>,
    pub platforms: PlatformService,
    pub parts: PartService,
    pub categories: CategoryService,
}

impl TestContext {
    pub fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Self {
            platforms: PlatformService::new(store.clone()),
            parts: PartService::new(store.clone()),
            categories: CategoryService::new(store.clone()),
            store,
        }
    }
}

/// Parse a platform payload the way the HTTP layer does.
pub fn input(value: Value) -> PlatformInput {
    serde_json::from_value(value).expect("valid platform payload")
}

pub fn active_input(name: &str, description: &str) -> PlatformInput {
    input(json!({ "name": name, "description": description, "active": true }))
}

pub fn part_input(value: Value) -> PartDefinitionInput {
    serde_json::from_value(value).expect("valid part payload")
}
