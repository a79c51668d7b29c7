//! Built-in interceptors.

mod logging;
mod parameter_encoder;
mod redirect;
mod validator;

pub use logging::{LogRequestAsCurlInterceptor, LogRequestInterceptor, LogResponseInterceptor};
pub use parameter_encoder::ParameterEncoder;
pub use redirect::{DEFAULT_MAX_REDIRECTS, RedirectHistory, RedirectInterceptor};
pub use validator::StatusValidator;
