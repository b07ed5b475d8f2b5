// Application state module
// Everything the request path reads, built once at startup and shared read-only

use hyper::body::Bytes;
use thiserror::Error;

use super::types::Config;
use crate::api;
use crate::dispatch::Dispatcher;
use crate::openapi;
use crate::routing::RouteError;

/// Failures while assembling the shared state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid route table: {0}")]
    Routes(#[from] RouteError),

    #[error("failed to serialize OpenAPI document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Application state
pub struct AppState {
    pub config: Config,
    pub dispatcher: Dispatcher,
    /// Serialized OpenAPI document
    pub openapi: Bytes,
}

impl AppState {
    /// Build the route table and its OpenAPI document
    pub fn new(config: Config) -> Result<Self, StateError> {
        let dispatcher = Dispatcher::new(api::routes())?;
        let document = openapi::document(
            dispatcher.routes(),
            &config.api.title,
            &config.api.version,
        );
        let openapi = Bytes::from(serde_json::to_vec(&document)?);

        Ok(Self {
            config,
            dispatcher,
            openapi,
        })
    }
}
