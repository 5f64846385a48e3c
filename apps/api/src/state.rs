use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single store instance, constructed once at startup. Each handler
    /// holds the lock for one store call, which serializes mutations.
    pub store: Arc<Mutex<ResumeStore>>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: ResumeStore, config: Config) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            config,
        }
    }
}
