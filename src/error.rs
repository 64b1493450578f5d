//! Error types for the sketching client.
//!
//! None of these ever reach the user: they are logged where they are dropped.
//! The only visible failure surface is the connectivity indicator.

use thiserror::Error;

/// Errors raised while resolving the backend configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported backend scheme `{0}` (expected http or https)")]
    UnsupportedScheme(String),

    #[error("backend url `{0}` has no host")]
    MissingHost(String),

    #[error("backend url `{0}` cannot carry a path")]
    NotABase(String),
}

/// Errors raised while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote service answered with an explicit error marker.
    #[error("remote error: {0}")]
    Remote(String),

    #[error("decision boundary grids are not rectangular ({0})")]
    RaggedGrid(String),

    #[error("response carries no prediction")]
    MissingPrediction,
}

/// Errors on the persistent training channel.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("websocket error: {0}")]
    Socket(#[from] tungstenite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("channel is not open")]
    NotOpen,
}

/// Errors on the one-shot prediction call.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
