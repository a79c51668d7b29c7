//! Optional request extensions: credentials, JSON bodies and text renderings.

pub mod authentication;
pub mod formatting;
mod json_body;

pub use authentication::AuthenticatedRequest;
pub use formatting::FormattingExt;
