use std::sync::Arc;

use kashaf_core::{Config, InferenceBackend};
use kashaf_ingest::DocumentReader;

/// Shared application state accessible from all handlers.
pub struct AppState {
    /// Server-side defaults. `api_key` holds the server's own credential, if any.
    pub config: Config,
    pub client: reqwest::Client,
    pub reader: DocumentReader,
    /// Fixed backend used instead of the hosted API when set.
    pub backend: Option<Arc<dyn InferenceBackend>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            reader: DocumentReader::new(),
            backend: None,
        }
    }
}
