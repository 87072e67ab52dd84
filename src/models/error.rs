//! Error types for entity validation

use thiserror::Error;

use super::entry::EntryStatus;

/// Errors raised when an entity would be put into an invalid state
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Status changes only move forward from `pending`
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: EntryStatus, to: EntryStatus },

    /// The entry URL could not be parsed
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    /// A required field was empty
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}
