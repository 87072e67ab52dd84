//! Linkshelf - a curated link directory
//!
//! This library provides the browsing core of the directory: the entity
//! model, a fuzzy search and filter pipeline, a client state store with
//! persisted preferences, and data backends over an embedded database or a
//! hosted REST API.

use thiserror::Error;

pub mod backend;
pub mod browse;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod keybinds;
pub mod models;
pub mod output;
pub mod palette;
pub mod search;
pub mod store;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum ShelfError {
    /// Database error
    #[error("Database error: {0}")]
    DbError(#[from] db::DbError),
    /// Search error
    #[error("Search error: {0}")]
    SearchError(#[from] search::SearchError),
    /// Backend error
    #[error(transparent)]
    BackendError(#[from] backend::BackendError),
    #[error(transparent)]
    BrowseError(#[from] browse::BrowseError),
    /// Entity validation error
    #[error("Invalid data: {0}")]
    ModelError(#[from] models::ModelError),
    /// Rendering error
    #[error("Output error: {0}")]
    OutputError(#[from] output::OutputError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, ShelfError>;
