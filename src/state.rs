//! Shared application state for all routes. The registry is mutated in place as models are
//! created and deleted, so new models are routable without a restart.

use crate::identity::IdentityProvider;
use crate::mirror::FileMirror;
use crate::registry::ModelRegistry;
use crate::sql::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub registry: Arc<ModelRegistry>,
    pub mirror: Arc<FileMirror>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        registry: ModelRegistry,
        mirror: FileMirror,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        AppState {
            store,
            registry: Arc::new(registry),
            mirror: Arc::new(mirror),
            identity,
        }
    }
}
