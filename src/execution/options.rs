//! Per-request execution configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::executor::{Executor, Job};
use super::interceptor::{RequestTransformer, ResponseTransformer};
use super::progress::Progress;
use crate::error::RequestError;
use crate::http::{Request, Response};
use crate::transport::Client;
use crate::utils::CancelHandle;

/// Callback run when a request is interrupted.
pub type InterruptCallback = Arc<dyn Fn(&Request) + Send + Sync>;

/// Decides whether a response counts as a success.
pub type ResponseValidator = Arc<dyn Fn(&Response) -> bool + Send + Sync>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Accepts 2xx responses only.
pub fn default_response_validator() -> ResponseValidator {
    Arc::new(|response: &Response| response.is_successful())
}

/// Accepts any response. Used for requests issued to follow a redirect, whose
/// final response is validated by the originating request.
fn accept_any_response() -> ResponseValidator {
    Arc::new(|_: &Response| true)
}

/// Everything a request needs at send time.
///
/// Seeded from the manager when the request is created. Edits made through
/// the request's builder methods are picked up at execution, not before.
#[derive(Clone)]
pub struct ExecutionOptions {
    /// Transport used to exchange the request.
    pub client: Arc<dyn Client>,
    /// Runs callback-style executions off the caller's thread.
    pub executor: Arc<dyn Executor>,
    /// Runs success and failure callbacks.
    pub callback_executor: Arc<dyn Executor>,
    pub request_transformer: RequestTransformer,
    pub response_transformer: ResponseTransformer,
    pub request_progress: Progress,
    pub response_progress: Progress,
    /// Connect timeout.
    pub timeout: Duration,
    /// Read timeout.
    pub timeout_read: Duration,
    pub allow_redirects: Option<bool>,
    pub use_http_cache: Option<bool>,
    pub interrupt_callbacks: Vec<InterruptCallback>,
    pub response_validator: ResponseValidator,
    pub(crate) cancel: CancelHandle,
    base_request_transformer: RequestTransformer,
    base_response_transformer: ResponseTransformer,
}

impl ExecutionOptions {
    pub fn new(
        client: Arc<dyn Client>,
        executor: Arc<dyn Executor>,
        callback_executor: Arc<dyn Executor>,
        request_transformer: RequestTransformer,
        response_transformer: ResponseTransformer,
    ) -> Self {
        Self {
            client,
            executor,
            callback_executor,
            base_request_transformer: Arc::clone(&request_transformer),
            base_response_transformer: Arc::clone(&response_transformer),
            request_transformer,
            response_transformer,
            request_progress: Progress::new(),
            response_progress: Progress::new(),
            timeout: DEFAULT_TIMEOUT,
            timeout_read: DEFAULT_TIMEOUT,
            allow_redirects: None,
            use_http_cache: None,
            interrupt_callbacks: Vec::new(),
            response_validator: default_response_validator(),
            cancel: CancelHandle::new(),
        }
    }

    /// Run `next` after the current response transformer.
    pub fn append_response_transformer<F>(&mut self, next: F)
    where
        F: Fn(&mut Request, Response) -> Result<Response, RequestError> + Send + Sync + 'static,
    {
        let previous = Arc::clone(&self.response_transformer);
        self.response_transformer = Arc::new(move |request: &mut Request, response: Response| {
            let response = previous(request, response)?;
            next(request, response)
        });
    }

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    /// Invoke every interrupt callback, in registration order.
    pub fn interrupt(&self, request: &Request) {
        for callback in &self.interrupt_callbacks {
            callback(request);
        }
    }

    pub fn callback(&self, job: Job) {
        self.callback_executor.execute(job);
    }

    pub fn submit(&self, job: Job) {
        self.executor.execute(job);
    }

    /// Options for a request issued to follow a redirect.
    ///
    /// Keeps the transport, executors, timeouts, progress handlers and
    /// cancellation handle. Transformers go back to the manager's pipeline and
    /// interrupt callbacks are dropped. The followed request accepts any
    /// status; the originating request validates the final response.
    pub fn for_redirect(&self) -> Self {
        Self {
            request_transformer: Arc::clone(&self.base_request_transformer),
            response_transformer: Arc::clone(&self.base_response_transformer),
            interrupt_callbacks: Vec::new(),
            response_validator: accept_any_response(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for ExecutionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionOptions")
            .field("timeout", &self.timeout)
            .field("timeout_read", &self.timeout_read)
            .field("allow_redirects", &self.allow_redirects)
            .field("use_http_cache", &self.use_http_cache)
            .field("request_progress", &self.request_progress)
            .field("response_progress", &self.response_progress)
            .field("interrupt_callbacks", &self.interrupt_callbacks.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{manager_with, respond_with};
    use url::Url;

    fn response(status: u16) -> Response {
        Response::new(Url::parse("https://example.com").unwrap(), status)
    }

    #[test]
    fn default_validator_accepts_only_success() {
        let validator = default_response_validator();
        assert!(validator(&response(200)));
        assert!(validator(&response(204)));
        assert!(!validator(&response(101)));
        assert!(!validator(&response(304)));
        assert!(!validator(&response(404)));
        assert!(!validator(&response(503)));
    }

    #[test]
    fn appended_transformers_run_after_existing_ones() {
        let manager = manager_with(respond_with(200, ""));
        let mut request = manager.get("https://example.com").unwrap();
        let options = request.execution_options_mut();
        options.append_response_transformer(|_, response| Ok(response.with_header("X-Step", "1")));
        options.append_response_transformer(|_, response| Ok(response.with_header("X-Step", "2")));

        let transformer = Arc::clone(&request.execution_options().response_transformer);
        let transformed = transformer(&mut request, response(200)).unwrap();
        assert_eq!(transformed.header("X-Step"), ["1", "2"]);
    }

    #[test]
    fn redirect_options_reset_request_specific_hooks() {
        let manager = manager_with(respond_with(200, ""));
        let request = manager
            .get("https://example.com")
            .unwrap()
            .valid_status(200..=200)
            .interrupt(|_| {})
            .timeout(Duration::from_secs(1));

        let options = request.execution_options().for_redirect();
        assert!(options.interrupt_callbacks.is_empty());
        assert!((options.response_validator)(&response(302)));
        assert!((options.response_validator)(&response(404)));
        assert_eq!(options.timeout, Duration::from_secs(1));

        request.cancel_handle().cancel();
        assert!(options.cancel_handle().is_cancelled());
    }
}
