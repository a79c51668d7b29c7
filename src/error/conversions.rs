//! Conversions from external error types.

use super::types::{RequestError, TransportError};

impl From<std::io::Error> for RequestError {
    fn from(err: std::io::Error) -> Self {
        Self::transport(TransportError::Io(err))
    }
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        Self::transport(err)
    }
}

impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigurationError(format!("invalid URL: {err}"))
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigurationError(format!("JSON encoding error: {err}"))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let error: RequestError = io.into();
        assert_eq!(error.category(), ErrorCategory::Network);
        assert!(error.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let error: RequestError = url::Url::parse("not a url").unwrap_err().into();
        assert_eq!(error.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: RequestError = err.into();
        assert!(matches!(error, RequestError::ConfigurationError(_)));
    }
}
