use std::ops::RangeInclusive;

use crate::error::RequestError;
use crate::execution::interceptor::{ResponseInterceptor, ResponseTransformer};
use crate::http::{Request, Response};

/// Rejects responses whose status falls outside an accepted range.
///
/// Runs as part of the response pipeline, before the request's own
/// validator.
#[derive(Debug, Clone)]
pub struct StatusValidator {
    accepted: RangeInclusive<u16>,
}

impl StatusValidator {
    pub fn new(accepted: RangeInclusive<u16>) -> Self {
        Self { accepted }
    }
}

impl ResponseInterceptor for StatusValidator {
    fn intercept(
        &self,
        request: &mut Request,
        response: Response,
        next: &ResponseTransformer,
    ) -> Result<Response, RequestError> {
        if !self.accepted.contains(&response.status_code()) {
            return Err(RequestError::validation(response));
        }
        next(request, response)
    }
}
