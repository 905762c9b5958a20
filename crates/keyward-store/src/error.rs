//! Error types for the storage layer.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No client record exists under the requested ID.
    #[error("client not found")]
    NotFound,

    /// `RocksDB` rejected an operation.
    #[error("database error: {0}")]
    Database(#[from] rocksdb::Error),

    /// The database was opened without a required column family.
    #[error("column family not found: {0}")]
    MissingColumnFamily(&'static str),

    /// A stored record failed to encode or decode as CBOR.
    #[error("serialization error: {0}")]
    Serialization(String),
}
