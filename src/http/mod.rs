//! HTTP data model: methods, headers, parameters, requests and responses.

pub mod capabilities;
pub mod headers;
mod method;
pub mod parameters;
mod request;
mod response;

pub use capabilities::Capabilities;
pub use headers::{HeaderWrite, Headers};
pub use method::Method;
pub use parameters::{ParamValue, Parameters};
pub use request::Request;
pub use response::Response;
