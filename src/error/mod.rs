//! Error Handling Module
//!
//! This module provides the error types used throughout the library:
//! - Core error type (`RequestError`) and its classification (`ErrorCategory`)
//! - Transport-level failures (`TransportError`)
//! - Conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use courier::error::{ErrorCategory, RequestError};
//!
//! let error = RequestError::configuration("base path is not set");
//! assert_eq!(error.category(), ErrorCategory::Configuration);
//! assert!(!error.is_retryable());
//! ```

mod conversions;
pub mod types;

pub use types::*;
