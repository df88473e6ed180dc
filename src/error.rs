//! Error types.
//!
//! `AppError` is what the binary sees: a message plus a process exit code.
//! `PipelineError` is the closed taxonomy used inside a metric run; every
//! variant eventually resolves to either a written file or the
//! preserve-existing path.

use std::path::PathBuf;

use thiserror::Error;

use crate::data::RetryError;

/// Process exit code for a hard failure.
pub const EXIT_FAILURE: u8 = 1;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(EXIT_FAILURE, err.to_string())
    }
}

/// Schema rejection of a candidate metric object.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("validation failed for {metric}: {}", .issues.join("; "))]
pub struct ValidationError {
    pub metric: String,
    pub issues: Vec<String>,
}

/// Failures inside a single metric pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Network-level failure or a non-2xx HTTP status.
    #[error("{source_name} API error: {message}{}", retry_note(.retries_exhausted))]
    Transport {
        source_name: &'static str,
        status: Option<u16>,
        message: String,
        /// Set when the retry loop gave up rather than stopping on a fatal status.
        retries_exhausted: bool,
    },

    /// The API answered but reported a logical failure.
    #[error("{source_name} API request failed: {message}")]
    UpstreamBusiness {
        source_name: &'static str,
        message: String,
    },

    /// A response body (not a single point) could not be understood.
    #[error("unexpected {context} shape: {message}")]
    DataShape { context: String, message: String },

    #[error("series {series_id} missing from upstream response")]
    MissingSeries { series_id: String },

    #[error("not enough data to derive {metric}: {reason}")]
    InsufficientData { metric: &'static str, reason: String },

    #[error("invalid composite weights: {0}")]
    Weights(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize metric: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn retry_note(exhausted: &bool) -> &'static str {
    if *exhausted { " (retries exhausted)" } else { "" }
}

/// Keeps the exhausted/aborted distinction on transport failures.
impl From<RetryError<PipelineError>> for PipelineError {
    fn from(err: RetryError<PipelineError>) -> Self {
        let exhausted = err.is_exhausted();
        match err.into_inner() {
            PipelineError::Transport {
                source_name,
                status,
                message,
                ..
            } => PipelineError::Transport {
                source_name,
                status,
                message,
                retries_exhausted: exhausted,
            },
            other => other,
        }
    }
}

impl PipelineError {
    /// HTTP status attached to a transport failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            PipelineError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}
