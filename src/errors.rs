/*!
 * Error types for the resxai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions. The variants follow
 * the failure classes of the translation run: configuration problems abort the
 * run, transient backend failures are retried, and everything else is fatal for
 * the current file only.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a completion backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl ProviderError {
    /// Whether another attempt may succeed.
    ///
    /// Non-success statuses and connection failures are transient. A body that
    /// arrived but could not be parsed will not improve on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_) | Self::ApiError { .. } | Self::ConnectionError(_)
        )
    }
}

/// Errors that can occur while reading or writing a resource file
#[derive(Error, Debug)]
pub enum FormatError {
    /// The file could not be read or written
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ResX document is not well-formed XML
    #[error("Malformed ResX document {path:?}: {message}")]
    Xml { path: PathBuf, message: String },

    /// The JSON document is not a flat string map
    #[error("Malformed JSON document {path:?}: {message}")]
    Json { path: PathBuf, message: String },

    /// The file extension is not one we translate
    #[error("Unsupported resource file: {0:?}")]
    Unsupported(PathBuf),
}

/// Errors that can occur while translating one file's batches
#[derive(Error, Debug)]
pub enum TranslationError {
    /// All attempts for a batch failed with transient errors
    #[error("Invalid response from backend after {attempts} attempts, check your API key: {last_error}")]
    BackendExhausted {
        attempts: u32,
        last_error: ProviderError,
    },

    /// The backend answered but the content is not a translated batch
    #[error("Malformed reply from backend: {0}")]
    MalformedReply(String),

    /// The run was cancelled while a batch was in flight or backing off
    #[error("Translation cancelled")]
    Cancelled,
}

/// Errors from the failure ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to access failure ledger {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a resource format adapter
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the failure ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl AppError {
    /// Whether this error should stop the whole run rather than just the current file
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Ledger(_) | Self::Translation(TranslationError::Cancelled)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
