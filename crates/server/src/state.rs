use std::sync::Arc;

use panelcheck_schema::{SchemaRegistry, Validator};

pub struct AppState {
    pub registry: Arc<SchemaRegistry>,
    pub validator: Validator,
}

impl AppState {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            validator: Validator::new(registry.clone()),
            registry,
        }
    }
}
