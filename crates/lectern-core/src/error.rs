//! Error types for lectern-core

use thiserror::Error;

/// Errors surfaced by a content engine handle (local or remote).
#[derive(Error, Debug)]
pub enum EngineError {
    /// Failed to construct or open an engine handle
    #[error("engine connection failed: {0}")]
    Connection(String),

    /// A query against an open engine failed
    #[error("engine query failed: {0}")]
    Query(String),

    /// The remote engine answered with a non-success status
    #[error("engine endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    /// HTTP transport failure talking to the remote engine
    #[error("engine transport failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answer could not be decoded
    #[error("failed to decode engine response: {0}")]
    Decode(#[from] serde_json::Error),

    /// No engine handle is usable for this request
    #[error("no usable engine for this request")]
    Unavailable,
}

/// Errors raised while preparing or checking the local database asset.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Filesystem operation failed
    #[error("filesystem operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// The bundled asset could not be resolved or fetched
    #[error("asset download failed: {0}")]
    Download(String),

    /// The fetched asset does not match its advertised fingerprint
    #[error("asset fingerprint mismatch: expected {expected}, got {actual}")]
    FingerprintMismatch { expected: String, actual: String },

    /// A fingerprint string is not valid SHA-256 hex
    #[error("invalid asset fingerprint: {0}")]
    InvalidFingerprint(String),

    /// Persisted key-value state could not be read or written
    #[error("state persistence failed: {0}")]
    Storage(String),

    /// Connecting the freshly synchronized local engine failed
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Storage(err.to_string())
    }
}

/// Errors raised by the v11n rule importer. All of these abort the batch.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Reading the rules file failed
    #[error("failed to read rules input: {0}")]
    Io(#[from] std::io::Error),

    /// A reference field is not of the form `Book.Chapter:Verse[.Subverse]`
    #[error("line {line}: malformed {field} reference")]
    MalformedReference { line: usize, field: &'static str },

    /// The book token of a reference maps to no known OSIS id
    #[error("line {line}: book {book:?} is not a valid book id")]
    UnknownBook { line: usize, book: String },

    /// The source-type field names no known versification tradition
    #[error("line {line}: unknown source type {name:?}")]
    UnknownSourceType { line: usize, name: String },

    /// The action field is outside the fixed action set
    #[error("line {line}: invalid action {action:?}")]
    InvalidAction { line: usize, action: String },

    /// Submitting the parsed batch to the engine failed
    #[error(transparent)]
    Engine(#[from] EngineError),
}
