//! Error types for the request layer and the normalizer that produces them.
//!
//! # Design
//! Every dispatcher operation fails with exactly one `RequestError`. The
//! variant records which stage failed (transport, HTTP status, decode,
//! serialization, validation) so callers can branch on `kind()` instead of
//! matching message text. `message()` is always the human-readable text a
//! caller would show, and `value()` carries the original thrown value when the
//! failure did not start out as an error object.
//!
//! Validators and other collaborators fail with a `Thrown`, which
//! `ensure_error` folds into a `RequestError`. A `Thrown` that already wraps a
//! `RequestError` comes back unchanged.

use serde::Deserialize;
use serde_json::Value;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `Client` operations.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The request never produced a response: connection refused, DNS, TLS,
    /// timeout, or a malformed request.
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The cancellation token in the request options fired.
    #[error("The operation was aborted.")]
    Aborted,

    /// The server answered with a non-2xx status. The message is the status
    /// text; the body is not inspected.
    #[error("{status_text}")]
    Status { status: u16, status_text: String },

    /// The payload did not match its declared content type or the declared
    /// response shape.
    #[error("{message}")]
    Decode { message: String },

    /// The request body could not be serialized to JSON.
    #[error("{message}")]
    Serialize { message: String },

    /// A validator rejected the decoded payload.
    #[error("{message}")]
    Validation {
        message: String,
        value: Option<Value>,
        #[source]
        source: Option<BoxError>,
    },
}

/// Coarse classification of a `RequestError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Aborted,
    Status,
    Decode,
    Serialize,
    Validation,
}

impl RequestError {
    pub(crate) fn transport(err: impl Into<BoxError>) -> Self {
        let source = err.into();
        RequestError::Transport {
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        RequestError::Decode {
            message: err.to_string(),
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The original thrown value, present only when the failure was not
    /// already an error object.
    pub fn value(&self) -> Option<&Value> {
        match self {
            RequestError::Validation { value, .. } => value.as_ref(),
            _ => None,
        }
    }

    /// HTTP status code for `Status` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Transport { .. } => ErrorKind::Transport,
            RequestError::Aborted => ErrorKind::Aborted,
            RequestError::Status { .. } => ErrorKind::Status,
            RequestError::Decode { .. } => ErrorKind::Decode,
            RequestError::Serialize { .. } => ErrorKind::Serialize,
            RequestError::Validation { .. } => ErrorKind::Validation,
        }
    }

    /// Whether the call was cancelled through its cancellation token.
    pub fn is_abort(&self) -> bool {
        matches!(self, RequestError::Aborted)
    }
}

/// A failure raised by a validator or another collaborator, before it has
/// been normalized.
#[derive(Debug)]
pub enum Thrown {
    /// An error object.
    Error(BoxError),
    /// A plain value with a JSON representation.
    Value(Value),
    /// A plain value that only has a string form.
    Opaque(String),
}

impl Thrown {
    pub fn value(value: impl Into<Value>) -> Self {
        Thrown::Value(value.into())
    }

    pub fn opaque(value: impl std::fmt::Display) -> Self {
        Thrown::Opaque(value.to_string())
    }
}

impl From<RequestError> for Thrown {
    fn from(err: RequestError) -> Self {
        Thrown::Error(Box::new(err))
    }
}

impl From<BoxError> for Thrown {
    fn from(err: BoxError) -> Self {
        Thrown::Error(err)
    }
}

impl From<serde_json::Error> for Thrown {
    fn from(err: serde_json::Error) -> Self {
        Thrown::Error(Box::new(err))
    }
}

impl From<Value> for Thrown {
    fn from(value: Value) -> Self {
        Thrown::Value(value)
    }
}

impl From<String> for Thrown {
    fn from(value: String) -> Self {
        Thrown::Value(Value::String(value))
    }
}

impl From<&str> for Thrown {
    fn from(value: &str) -> Self {
        Thrown::Value(Value::String(value.to_string()))
    }
}

/// Fold any thrown failure into a `RequestError`.
///
/// An error that already is a `RequestError` is returned as-is. Other error
/// objects become the `source` of a `Validation` error. Plain values become a
/// `Validation` error whose message is their JSON text and which keeps the
/// value for inspection.
pub fn ensure_error(thrown: Thrown) -> RequestError {
    match thrown {
        Thrown::Error(err) => match err.downcast::<RequestError>() {
            Ok(err) => *err,
            Err(other) => RequestError::Validation {
                message: other.to_string(),
                value: None,
                source: Some(other),
            },
        },
        Thrown::Value(value) => {
            let message = serde_json::to_string(&value).unwrap_or_else(|_| value.to_string());
            RequestError::Validation {
                message,
                value: Some(value),
                source: None,
            }
        }
        Thrown::Opaque(text) => RequestError::Validation {
            message: text.clone(),
            value: Some(Value::String(text)),
            source: None,
        },
    }
}

#[derive(Deserialize)]
struct Envelope {
    error: String,
}

/// Read the `{"error": "..."}` envelope the backend puts on non-2xx bodies.
///
/// The dispatcher reports only the status text; callers that want the server's
/// own message can run the raw body through this.
pub fn error_envelope(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Envelope>(body).ok().map(|e| e.error)
}
