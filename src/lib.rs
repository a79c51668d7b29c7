//! courier
//!
//! HTTP client with interceptor pipelines, multipart bodies and three ways to
//! execute a request: blocking, callback-style with a cancellable handle, and
//! `async`.
//!
//! ```ignore
//! let manager = courier::Manager::builder()
//!     .with_base_path("https://httpbin.org")
//!     .build()?;
//! let (response, body) = manager
//!     .get("/get")?
//!     .parameter("q", "rust")
//!     .response_string()?;
//! ```
#![deny(unsafe_code)]

pub mod body;
pub mod deserialize;
pub mod download;
pub mod error;
pub mod execution;
pub mod extensions;
pub mod http;
pub mod manager;
pub mod multipart;
pub mod transport;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use body::{Body, DefaultBody, RepeatableBody};
pub use deserialize::{
    ByteArrayDeserializer, EmptyDeserializer, JsonDeserializer, ResponseDeserializable,
    StringDeserializer,
};
pub use download::DownloadDestination;
pub use error::{ErrorCategory, RequestError, TransportError};
pub use execution::{CancellableRequest, ExecutionOptions, Outcome, RequestInterceptor, ResponseInterceptor};
pub use extensions::{AuthenticatedRequest, FormattingExt};
pub use http::{Headers, Method, ParamValue, Parameters, Request, Response};
pub use manager::{Manager, ManagerBuilder, ManagerConfig};
pub use multipart::DataPart;
pub use transport::{Client, ReqwestClient};
pub use utils::CancelHandle;

static_assertions::assert_impl_all!(Request: Send);
static_assertions::assert_impl_all!(Response: Send);
static_assertions::assert_impl_all!(Manager: Send, Sync);
static_assertions::assert_impl_all!(CancellableRequest: Send, Sync);
