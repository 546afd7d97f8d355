//! Error taxonomy for the store: invalid catalogs, codec failures,
//! engine (upstream) failures and rejected write batches.

use thiserror::Error;

/// Errors that can arise while encoding, planning, scanning or writing.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The index catalog is invalid: empty, duplicated or malformed orderings.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A key could not be encoded or decoded (unknown tag, bad length header,
    /// oversize field). Points at corrupted storage or a codec mismatch.
    #[error("codec error: {0}")]
    Codec(String),
    /// The key-value engine failed during a scan or lookup.
    #[error("upstream error: {0}")]
    Upstream(String),
    /// An atomic write batch was rejected; none of its operations are visible.
    #[error("batch rejected: {0}")]
    Batch(String),
    /// A persisted structured record (scope row, config file) could not be
    /// (de)serialized.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn codec(msg: impl Into<String>) -> Self {
        StoreError::Codec(msg.into())
    }

    /// True for errors that indicate corrupted data or a programming mistake
    /// rather than a transient engine failure.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, StoreError::Codec(_) | StoreError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
