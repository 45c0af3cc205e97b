//! Unified application error type.
//! The session itself only ever produces `ConfigurationMissing` and
//! `DatabaseOperationFailed`; the remaining variants belong to the
//! configuration file, export and CLI layers.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // Session
    // ---------------------------
    /// The named connection string could not be resolved.
    #[error("Connection string '{0}' not found in configuration")]
    ConfigurationMissing(String),

    /// Any failure raised by the database client.
    ///
    /// Only the message text survives: error codes and the underlying
    /// `rusqlite::Error` are dropped when the error is wrapped.
    #[error("{0}")]
    DatabaseOperationFailed(String),

    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // ---------------------------
    // CLI input
    // ---------------------------
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::DatabaseOperationFailed(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
