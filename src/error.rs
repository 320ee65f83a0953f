//! Error types for the explorer gateway
//!
//! `UpstreamError` covers failures talking to the node, the indexer and the
//! geolocation service. `ExplorerError` is what handlers return; it maps
//! onto HTTP status codes and a `{ "error": ... }` JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Failure reported by (or while reaching) an upstream collaborator
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Node RPC error: {0}")]
    Rpc(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{service} returned {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Geolocation lookup unsuccessful for {0}")]
    GeoUnavailable(String),
}

impl UpstreamError {
    /// Message surfaced to clients on lookup failures
    ///
    /// Indexer error bodies are passed through verbatim instead of being
    /// wrapped in our own prefix.
    pub fn upstream_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<bitcoincore_rpc::Error> for UpstreamError {
    fn from(err: bitcoincore_rpc::Error) -> Self {
        Self::Rpc(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ExplorerError {
    /// Missing or malformed path parameter
    #[error("{0}")]
    BadRequest(String),

    /// Upstream reported absence (or failed) on a lookup
    #[error("{message}")]
    NotFound {
        message: String,
        echo: Option<(&'static str, String)>,
    },

    /// Upstream data violates a structural assumption, e.g. a malformed coinbase
    #[error("Data integrity fault: {0}")]
    DataIntegrity(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ExplorerError {
    pub fn not_found(err: UpstreamError, key: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            message: err.upstream_message(),
            echo: Some((key, id.into())),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::DataIntegrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ExplorerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::warn!("Request failed ({}): {}", status, self);
        }

        let mut body = Map::new();
        body.insert("error".to_string(), json!(self.to_string()));
        if let Self::NotFound {
            echo: Some((key, id)),
            ..
        } = self
        {
            body.insert(key.to_string(), Value::String(id));
        }

        (status, Json(Value::Object(body))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
