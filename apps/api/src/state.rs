use std::sync::Arc;

use crate::storage::UserStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Storage gateway. DynamoDB in production, in-memory in tests.
    pub store: Arc<dyn UserStore>,
}
