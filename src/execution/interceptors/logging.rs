//! Interceptors that log traffic via `tracing` (target `courier::http`).

use crate::error::RequestError;
use crate::execution::interceptor::{
    RequestInterceptor, RequestTransformer, ResponseInterceptor, ResponseTransformer,
};
use crate::extensions::formatting::FormattingExt;
use crate::http::{Request, Response};

/// Logs each outgoing request line and headers at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequestInterceptor;

impl RequestInterceptor for LogRequestInterceptor {
    fn intercept(
        &self,
        request: Request,
        next: &RequestTransformer,
    ) -> Result<Request, RequestError> {
        tracing::debug!(target: "courier::http", method = %request.method(), url = %request.url(), "sending request\n{request}");
        next(request)
    }
}

/// Logs each outgoing request as a cURL command at debug level.
///
/// Makes the request body repeatable so it can be shown and still be sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequestAsCurlInterceptor;

impl RequestInterceptor for LogRequestAsCurlInterceptor {
    fn intercept(
        &self,
        mut request: Request,
        next: &RequestTransformer,
    ) -> Result<Request, RequestError> {
        let curl = request.curl_string();
        tracing::debug!(target: "courier::http", "{curl}");
        next(request)
    }
}

/// Logs each received response at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogResponseInterceptor;

impl ResponseInterceptor for LogResponseInterceptor {
    fn intercept(
        &self,
        request: &mut Request,
        response: Response,
        next: &ResponseTransformer,
    ) -> Result<Response, RequestError> {
        tracing::debug!(target: "courier::http", status = response.status_code(), url = %response.url(), "response received\n{response}");
        next(request, response)
    }
}
