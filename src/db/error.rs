//! Database-specific error types
//!
//! This module defines all error types that can occur during database operations.
//!
//! # Error Types
//!
//! - **`SledError`**: Errors from the underlying sled embedded database
//! - **`DecodeError`**: Failures when deserializing data from the database
//! - **`EncodeError`**: Failures when serializing data to the database
//! - **`SerializeError`**: Other serialization problems (e.g. non UTF-8 keys)
//! - **`NotFound`**: The requested entry does not exist
//! - **`InvalidInput`**: A value failed validation before being written

use thiserror::Error;

/// Database-specific errors
#[derive(Debug, Error)]
pub enum DbError {
    /// Represents a sled database error
    #[error("Database error: {0}")]
    SledError(#[from] sled::Error),

    /// Represents a bincode decoding error
    #[error("Error while decoding data: {0}")]
    DecodeError(#[from] bincode::error::DecodeError),

    /// Represents a bincode encoding error
    #[error("Error while encoding data: {0}")]
    EncodeError(#[from] bincode::error::EncodeError),

    /// Generic serialization/deserialization error
    #[error("Error during serialization: {0}")]
    SerializeError(String),

    /// No record with this id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input provided (e.g., an entry without a title)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
