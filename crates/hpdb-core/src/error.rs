//! Error types for client operations.
//!
//! Every failure surfaces as one [`Error`] variant: configuration problems and bad
//! caller input fail before any network I/O, transport and API failures carry enough
//! context (status code, raw body) to act on, and decode failures are kept apart from
//! transport failures.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Main error type for client operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Missing or invalid client setup
    #[error("Configuration error: {field}: {message}")]
    Configuration {
        /// Name of the offending property
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// Caller input rejected before any network I/O
    #[error("Validation failed for {operation}: {message}")]
    Validation {
        /// Operation being built
        operation: String,
        /// Every required parameter that was not bound
        missing: Vec<String>,
        /// Human-readable summary
        message: String,
    },

    /// Connection, timeout or I/O failure
    #[error("Transport error ({kind}): {message}")]
    Transport {
        /// Failure category
        kind: TransportErrorKind,
        /// Error message
        message: String,
    },

    /// Server rejected the request
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Success response whose body could not be decoded
    #[error("Failed to decode response (status {status}): {message}")]
    Decode {
        /// HTTP status of the response, 0 when the payload did not come from one
        status: u16,
        /// Decoder message
        message: String,
        /// Raw body text
        body: String,
    },

    /// Call aborted by its cancellation token or deadline
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

/// Specialized result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// Could not establish a connection
    Connect,
    /// Request or connect timeout
    Timeout,
    /// Failure while sending the request or reading the response
    Io,
    /// Anything else (request could not be constructed, etc.)
    Other,
}

impl TransportErrorKind {
    /// Returns true when a failure of this kind is worth retrying.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Connect | Self::Timeout | Self::Io)
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Io => "io",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Non-2xx response from the service.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("API error {status}: {message}")]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Vendor error code, when the body carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Vendor error message, or the status reason when none was found
    pub message: String,
    /// Raw response body
    pub body: String,
}

impl ApiError {
    /// Build an API error from a response status and body.
    ///
    /// JSON bodies are searched for the vendor code and message in the shapes used by
    /// IBM Cloud services: `{"errors":[{"code","message"}]}`, `{"code","message"}`,
    /// `{"error": ...}` and `{"errorMessage": ...}`.
    #[must_use]
    pub fn from_response(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        let parsed = serde_json::from_str::<Value>(&body).ok();

        let (code, message) = parsed
            .as_ref()
            .map_or((None, None), |value| (vendor_code(value), vendor_message(value)));

        let message = message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| status.as_str().to_string(), ToString::to_string)
        });

        Self {
            status: status.as_u16(),
            code,
            message,
            body,
        }
    }

    /// Returns true for rate limiting and server-side failures.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

fn first_error(value: &Value) -> Option<&Value> {
    value.get("errors").and_then(Value::as_array).and_then(|e| e.first())
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn vendor_code(value: &Value) -> Option<String> {
    first_error(value)
        .and_then(|e| e.get("code"))
        .or_else(|| value.get("code"))
        .or_else(|| value.get("error_code"))
        .and_then(as_text)
}

fn vendor_message(value: &Value) -> Option<String> {
    first_error(value)
        .and_then(|e| e.get("message"))
        .or_else(|| value.get("error"))
        .or_else(|| value.get("message"))
        .or_else(|| value.get("errorMessage"))
        .and_then(as_text)
}

impl Error {
    /// Shorthand for a configuration error.
    #[must_use]
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Validation error naming every missing required parameter.
    #[must_use]
    pub fn missing_parameters(operation: impl Into<String>, missing: Vec<String>) -> Self {
        let message = format!("missing required parameters: {}", missing.join(", "));
        Self::Validation {
            operation: operation.into(),
            missing,
            message,
        }
    }

    /// Validation error for a parameter that is bound but unusable.
    #[must_use]
    pub fn invalid_parameter(
        operation: impl Into<String>,
        name: &str,
        reason: impl fmt::Display,
    ) -> Self {
        Self::Validation {
            operation: operation.into(),
            missing: Vec::new(),
            message: format!("invalid parameter `{name}`: {reason}"),
        }
    }

    /// Shorthand for a transport error.
    #[must_use]
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Transport {
                kind: TransportErrorKind::Timeout,
                ..
            } => "TIMEOUT",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Api(_) => "API_ERROR",
            Self::Decode { .. } => "DECODE_ERROR",
            Self::Cancelled(_) => "CANCELLED",
        }
    }

    /// Returns true if the failure is transient and the request may be sent again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { kind, .. } => kind.is_transient(),
            Self::Api(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// HTTP status associated with the error, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => Some(err.status),
            Self::Decode { status, .. } if *status != 0 => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub fn should_log(&self) -> bool {
        match self {
            Self::Configuration { .. } | Self::Decode { .. } => true,
            Self::Api(err) => err.status >= 500,
            _ => false,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_builder() {
            TransportErrorKind::Other
        } else {
            TransportErrorKind::Io
        };
        Self::transport(kind, err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::config("url", err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            status: 0,
            message: err.to_string(),
            body: String::new(),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = err.field_errors().keys().map(ToString::to_string).collect();
        fields.sort();
        Self::config(fields.join(", "), err.to_string())
    }
}
