//! Error types and error code constants for archer.
//!
//! `ArcherError` is the single error type rendered by the CLI. Domain errors
//! from the filter engine, the model and the configuration layer are bridged
//! into it with `From` impls.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (rule syntax, bad config value)
//! - `3`: Resolution errors (data file not found, unknown or duplicate
//!   entity in the dataset)
//! - `10`: Internal errors (I/O, JSON, unexpected state)

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::filter::FilterError;
use crate::model::ModelError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output. They double as process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad rule, bad option).
    InvalidArguments = 2,
    /// Resolution errors (missing data file, dangling reference).
    ResolutionError = 3,
    /// Internal errors (I/O, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum ArcherError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// A rule that does not parse.
    #[error("invalid {kind} rule: {source}")]
    InvalidRule {
        kind: &'static str,
        #[source]
        source: FilterError,
    },

    /// The dataset file does not exist.
    #[error("data file not found: {path}")]
    DataNotFound { path: String },

    /// The dataset cannot be resolved into a consistent graph.
    #[error("invalid dataset: {message}")]
    InvalidDataset { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&ArcherError> for OutputErrorCode {
    fn from(err: &ArcherError) -> Self {
        match err {
            ArcherError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            ArcherError::InvalidRule { .. } => OutputErrorCode::InvalidArguments,
            ArcherError::DataNotFound { .. } => OutputErrorCode::ResolutionError,
            ArcherError::InvalidDataset { .. } => OutputErrorCode::ResolutionError,
            ArcherError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<ArcherError> for OutputErrorCode {
    fn from(err: ArcherError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<FilterError> for ArcherError {
    fn from(err: FilterError) -> Self {
        ArcherError::InvalidRule {
            kind: "project",
            source: err,
        }
    }
}

impl From<ModelError> for ArcherError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::DataNotFound { path } => ArcherError::DataNotFound {
                path: path.display().to_string(),
            },
            ModelError::DuplicateProject { .. }
            | ModelError::DuplicateId { .. }
            | ModelError::IdOverflow { .. }
            | ModelError::UnknownReference { .. } => ArcherError::InvalidDataset {
                message: err.to_string(),
            },
            ModelError::Io(io_err) => ArcherError::InternalError {
                message: format!("IO error: {}", io_err),
            },
            ModelError::Json(json_err) => ArcherError::InvalidDataset {
                message: format!("JSON error: {}", json_err),
            },
        }
    }
}

impl From<ConfigError> for ArcherError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io { .. } => ArcherError::InternalError {
                message: err.to_string(),
            },
            ConfigError::Json { .. } | ConfigError::InvalidValue { .. } => {
                ArcherError::invalid_args(err.to_string())
            }
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl ArcherError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        ArcherError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        ArcherError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Wrap a rule parse error, naming the entity kind the rule was for.
    pub fn invalid_rule(kind: &'static str, source: FilterError) -> Self {
        ArcherError::InvalidRule { kind, source }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ArcherError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
