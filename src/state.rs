//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the store, the mail transport, and the startup configuration. There
//! is no other process-wide mutable state.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::notify::Mailer;
use crate::store::Store;

/// Clone is required by Axum; every field is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: AppConfig) -> Self {
        Self { store, mailer, config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
