//! Utility modules shared across the crate.

pub mod cancel;
pub mod mime;

pub use cancel::CancelHandle;
