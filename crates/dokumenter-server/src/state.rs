//! Shared application state.

use std::sync::Arc;

use dokumenter_saf::{DocumentSource, SafClient};

use crate::auth::TokenValidator;

/// Immutable after startup; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<TokenValidator>,
    pub documents: Arc<dyn DocumentSource>,
    /// Concurrent variant fetches for the aggregate PDF endpoint.
    pub pdf_concurrency: usize,
}

impl AppState {
    pub fn new(validator: TokenValidator, documents: Arc<dyn DocumentSource>, pdf_concurrency: usize) -> Self {
        Self {
            validator: Arc::new(validator),
            documents,
            pdf_concurrency: pdf_concurrency.max(1),
        }
    }

    pub fn with_saf_client(validator: TokenValidator, client: SafClient) -> Self {
        let concurrency = client.pdf_concurrency();
        Self::new(validator, Arc::new(client), concurrency)
    }
}
