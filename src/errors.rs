/*!
 * Error types for the doctrans application.
 *
 * This module contains the error taxonomy for the translation pipeline,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Only document-level failures (`DecodeError`, `SerializeError`) abort a run.
 * `BackendError` and `WriteBackError` are absorbed per element by the
 * orchestrator and the document walker.
 */

use thiserror::Error;

/// Errors raised by a translation backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend needs credentials that were not configured
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The request could not be sent or the connection dropped
    #[error("Network failure: {0}")]
    Network(String),

    /// The account quota is exhausted
    #[error("Quota exceeded: {0}")]
    Quota(String),

    /// The provider throttled the request
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The provider answered but produced no text
    #[error("Backend returned an empty result")]
    EmptyResult,

    /// A polled job did not reach a terminal state in time
    #[error("Timed out after {polls} status checks")]
    Timeout {
        /// Number of status checks performed
        polls: u32,
    },

    /// A document job reached its failure state
    #[error("Translation job failed: {0}")]
    JobFailed(String),
}

impl BackendError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited(_) => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }

    /// Map an HTTP status and body onto the taxonomy
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::MissingCredentials(message),
            429 => Self::RateLimited(message),
            // DeepL reports an exhausted character quota with 456
            456 => Self::Quota(message),
            _ => Self::Api { status_code, message },
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::MalformedResponse(error.to_string())
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16(), error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// No candidate encoding produced a parseable document
#[derive(Error, Debug)]
#[error("Unable to read {path} with any candidate encoding ({})", attempts.join("; "))]
pub struct DecodeError {
    /// Input file that was being opened
    pub path: String,
    /// One entry per candidate encoding: label and cause
    pub attempts: Vec<String>,
}

/// The output document could not be persisted
#[derive(Error, Debug)]
pub enum SerializeError {
    /// A value contains characters the format writer cannot represent
    #[error("Value rejected by the writer at {location}: {reason}")]
    RejectedValue {
        /// Container and element of the offending value
        location: String,
        /// Why the writer refused it
        reason: String,
    },

    /// Writing or persisting the file failed
    #[error("Failed to write {path}: {message}")]
    Io {
        /// Output path
        path: String,
        /// Underlying cause
        message: String,
    },
}

/// A single element could not accept a translated value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteBackError {
    /// The element handle no longer points at a text-bearing element
    #[error("Element {0} not found")]
    MissingElement(String),

    /// The value contains characters the element cannot hold
    #[error("Value rejected for element {element}: {reason}")]
    Rejected {
        /// Element identifier
        element: String,
        /// Why the value was refused
        reason: String,
    },

    /// The element kind carries no writable text field
    #[error("Element {element} ({kind}) has no writable text")]
    ReadOnly {
        /// Element identifier
        element: String,
        /// Element kind name
        kind: String,
    },
}

/// The input is not a well-formed document
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Parse error at line {line}: {message}")]
pub struct ParseError {
    /// 1-based line number in the decoded text
    pub line: usize,
    /// What was expected
    pub message: String,
}

/// Document-level failure surfaced to the caller of a run
#[derive(Error, Debug)]
pub enum RunError {
    /// Input could not be decoded or parsed
    #[error("Decode stage failed: {0}")]
    Decode(#[from] DecodeError),

    /// Output could not be written
    #[error("Serialize stage failed: {0}")]
    Serialize(#[from] SerializeError),

    /// Any file-system failure outside of serialization
    #[error("File error: {0}")]
    Io(String),

    /// The run could not be configured (backend construction, glossary)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RunError {
    /// Name of the pipeline stage that failed, for user-facing reports
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Serialize(_) => "serialize",
            Self::Io(_) => "io",
            Self::Config(_) => "config",
        }
    }
}

impl From<std::io::Error> for RunError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<anyhow::Error> for RunError {
    fn from(error: anyhow::Error) -> Self {
        Self::Config(error.to_string())
    }
}
