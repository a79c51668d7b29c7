//! Core error types.

use thiserror::Error;

use crate::http::Response;

/// Boxed error returned by user-supplied deserializers and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures raised by a [`Client`](crate::transport::Client) while talking to the network.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request was cancelled or its worker was interrupted.
    #[error("request was interrupted")]
    Interrupted,

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol-level failures reported by the underlying HTTP stack.
    #[error("HTTP transport error: {0}")]
    Http(String),
}

impl TransportError {
    /// Whether this failure was caused by cancellation rather than by the network.
    pub fn is_interruption(&self) -> bool {
        match self {
            Self::Interrupted => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::Interrupted,
            _ => false,
        }
    }
}

/// Error kinds surfaced by request execution.
///
/// Variants that happen after a response was received carry that response so
/// callers can inspect status, headers and body.
#[derive(Error, Debug)]
pub enum RequestError {
    /// A body or request was used in a state that does not allow the operation.
    #[error("State error: {0}")]
    StateError(String),

    /// The request or a collaborator is misconfigured.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A multipart request has no boundary in its Content-Type header.
    #[error("Configuration error: no multipart boundary in Content-Type `{content_type}`")]
    BoundaryMissing { content_type: String },

    /// The client failed to exchange the request.
    #[error("Transport error: {source}")]
    TransportError {
        #[source]
        source: TransportError,
        response: Option<Box<Response>>,
    },

    /// The response validator rejected the response.
    #[error("HTTP {status}: {message}")]
    ValidationError {
        status: u16,
        message: String,
        response: Box<Response>,
    },

    /// A deserializer failed to turn the response into a value.
    #[error("Deserialization error: {source}")]
    DeserializationError {
        #[source]
        source: BoxError,
        response: Box<Response>,
    },

    /// A redirect could not be followed.
    #[error("Redirect error: {message}")]
    RedirectError {
        message: String,
        response: Option<Box<Response>>,
    },
}

/// Broad classification of a [`RequestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    State,
    Configuration,
    Network,
    Interrupted,
    Validation,
    Deserialization,
    Redirect,
}

impl RequestError {
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// Error for a body whose single-use source was already read.
    pub fn consumed() -> Self {
        Self::StateError("the body has already been consumed and cannot be read again".into())
    }

    pub fn transport(source: TransportError) -> Self {
        Self::TransportError {
            source,
            response: None,
        }
    }

    pub fn interrupted() -> Self {
        Self::transport(TransportError::Interrupted)
    }

    /// Build a validation failure for a response the validator rejected.
    pub fn validation(response: Response) -> Self {
        let status = response.status_code();
        let message = if response.response_message().is_empty() {
            "response failed validation".to_string()
        } else {
            response.response_message().to_string()
        };
        Self::ValidationError {
            status,
            message,
            response: Box::new(response),
        }
    }

    pub fn deserialization(source: impl Into<BoxError>, response: Response) -> Self {
        Self::DeserializationError {
            source: source.into(),
            response: Box::new(response),
        }
    }

    pub fn redirect(message: impl Into<String>, response: Option<Response>) -> Self {
        Self::RedirectError {
            message: message.into(),
            response: response.map(Box::new),
        }
    }

    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::StateError(_) => ErrorCategory::State,
            Self::ConfigurationError(_) | Self::BoundaryMissing { .. } => {
                ErrorCategory::Configuration
            }
            Self::TransportError { source, .. } if source.is_interruption() => {
                ErrorCategory::Interrupted
            }
            Self::TransportError { .. } => ErrorCategory::Network,
            Self::ValidationError { .. } => ErrorCategory::Validation,
            Self::DeserializationError { .. } => ErrorCategory::Deserialization,
            Self::RedirectError { .. } => ErrorCategory::Redirect,
        }
    }

    /// Whether the failure came from cancellation or worker interruption.
    pub fn caused_by_interruption(&self) -> bool {
        self.category() == ErrorCategory::Interrupted
    }

    /// Whether sending the same request again could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransportError { source, .. } => matches!(
                source,
                TransportError::Timeout(_) | TransportError::Connect(_) | TransportError::Io(_)
            ) && !source.is_interruption(),
            Self::ValidationError { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// The response attached to this error, if one was received.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::TransportError { response, .. } | Self::RedirectError { response, .. } => {
                response.as_deref()
            }
            Self::ValidationError { response, .. }
            | Self::DeserializationError { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Take the attached response out of this error.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::TransportError { response, .. } | Self::RedirectError { response, .. } => {
                response.map(|r| *r)
            }
            Self::ValidationError { response, .. }
            | Self::DeserializationError { response, .. } => Some(*response),
            _ => None,
        }
    }

    /// Status code of the attached response, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.response().map(Response::status_code)
    }
}
