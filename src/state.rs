use std::sync::Arc;

use crate::authz::AccessResolver;
use crate::storage::ObjectStorage;
use crate::store::ResourceStore;

/// Shared application state. The store handle is constructed at startup and
/// injected here; nothing reaches for a global client.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResourceStore>,
    pub resolver: AccessResolver,
    pub storage: Option<Arc<ObjectStorage>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ResourceStore>, storage: Option<ObjectStorage>) -> Self {
        Self {
            resolver: AccessResolver::new(store.clone()),
            store,
            storage: storage.map(Arc::new),
        }
    }
}
