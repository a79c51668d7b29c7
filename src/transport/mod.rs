//! Transport seam.
//!
//! A [`Client`] exchanges one fully prepared request for a response. It
//! writes the request body (reporting request progress), reads the response
//! body (reporting response progress) and never follows redirects itself.

mod reqwest_client;

pub use crate::error::TransportError;
pub use reqwest_client::{ReqwestClient, build_reqwest_client};

use async_trait::async_trait;

use crate::http::{Request, Response};

#[async_trait]
pub trait Client: Send + Sync {
    /// Blocking exchange.
    fn execute(&self, request: &mut Request) -> Result<Response, TransportError>;

    /// Async exchange. Defaults to the blocking one.
    async fn execute_async(&self, request: &mut Request) -> Result<Response, TransportError> {
        self.execute(request)
    }
}
