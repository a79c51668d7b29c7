//! The request task: one pass through the execution pipeline.
//!
//! ```text
//! Built -> TransformingRequest -> Sending -> TransformingResponse -> Validating -> Succeeded
//!                 |                  |                |                  |
//!                 +------------------+----------------+------------------+--> Failed
//! ```

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::deserialize::{
    ByteArrayDeserializer, JsonDeserializer, ResponseDeserializable, ResponseOf,
    StringDeserializer,
};
use crate::error::RequestError;
use crate::http::{Request, Response};

/// Stage of a request task, reported in trace logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    Built,
    TransformingRequest,
    Sending,
    TransformingResponse,
    Validating,
    Succeeded,
    Failed,
}

impl std::fmt::Display for ExecutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Built => "built",
            Self::TransformingRequest => "transforming-request",
            Self::Sending => "sending",
            Self::TransformingResponse => "transforming-response",
            Self::Validating => "validating",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn enter(stage: ExecutionStage, request: &Request) {
    tracing::trace!(target: "courier::task", %stage, method = %request.method(), url = %request.url(), "request stage");
}

/// Executes one request on the calling thread.
pub struct RequestTask {
    request: Request,
}

impl RequestTask {
    pub fn new(request: Request) -> Self {
        Self { request }
    }

    /// Run the request through the request pipeline, the client, the
    /// response pipeline and the validator.
    ///
    /// Interrupt callbacks fire when the failure was caused by interruption.
    pub fn call(self) -> Result<Response, RequestError> {
        let mut request = Self::prepare(self.request)?;

        let result = match Self::ensure_not_cancelled(&request) {
            Ok(()) => {
                enter(ExecutionStage::Sending, &request);
                let client = Arc::clone(&request.execution_options().client);
                match client.execute(&mut request) {
                    Ok(response) => Self::finish(&mut request, response),
                    Err(source) => Err(RequestError::transport(source)),
                }
            }
            Err(e) => Err(e),
        };
        Self::conclude(&request, result)
    }

    /// Apply the request pipeline and build any deferred body.
    ///
    /// A failure here ends the task before anything is sent.
    pub(crate) fn prepare(request: Request) -> Result<Request, RequestError> {
        enter(ExecutionStage::Built, &request);
        enter(ExecutionStage::TransformingRequest, &request);
        let method = request.method();
        let url = request.url().clone();
        let transformer = Arc::clone(&request.execution_options().request_transformer);
        transformer(request)
            .and_then(|mut request| {
                request.prepare_body()?;
                Ok(request)
            })
            .inspect_err(|e| {
                tracing::trace!(
                    target: "courier::task",
                    stage = %ExecutionStage::Failed,
                    %method,
                    %url,
                    error = %e,
                    "request stage"
                );
            })
    }

    pub(crate) fn ensure_not_cancelled(request: &Request) -> Result<(), RequestError> {
        if request.cancel_handle().is_cancelled() {
            return Err(RequestError::interrupted());
        }
        Ok(())
    }

    /// Response pipeline followed by validation.
    pub(crate) fn finish(request: &mut Request, response: Response) -> Result<Response, RequestError> {
        enter(ExecutionStage::TransformingResponse, request);
        let transformer = Arc::clone(&request.execution_options().response_transformer);
        let response = transformer(request, response)?;

        enter(ExecutionStage::Validating, request);
        if !(request.execution_options().response_validator)(&response) {
            return Err(RequestError::validation(response));
        }
        Ok(response)
    }

    pub(crate) fn conclude(
        request: &Request,
        result: Result<Response, RequestError>,
    ) -> Result<Response, RequestError> {
        match &result {
            Ok(_) => enter(ExecutionStage::Succeeded, request),
            Err(e) => {
                enter(ExecutionStage::Failed, request);
                if e.caused_by_interruption() {
                    tracing::debug!(target: "courier::task", url = %request.url(), "request interrupted");
                    request.execution_options().interrupt(request);
                }
            }
        }
        result
    }
}

/// Blocking execution.
impl Request {
    /// Execute on the calling thread and return the raw response.
    ///
    /// Must not be called from inside an async task driven by the same
    /// runtime as the transport; use [`Request::await_response`] there.
    pub fn execute(self) -> Result<Response, RequestError> {
        RequestTask::new(self).call()
    }

    pub fn response_object<D>(self, deserializer: &D) -> Result<ResponseOf<D::Output>, RequestError>
    where
        D: ResponseDeserializable + ?Sized,
    {
        let response = self.execute()?;
        deserializer.deserialize(response)
    }

    /// Execute and read the body as bytes.
    pub fn response(self) -> Result<ResponseOf<Bytes>, RequestError> {
        self.response_object(&ByteArrayDeserializer)
    }

    pub fn response_string(self) -> Result<ResponseOf<String>, RequestError> {
        self.response_object(&StringDeserializer::new())
    }

    pub fn response_json<T: DeserializeOwned>(self) -> Result<ResponseOf<T>, RequestError> {
        self.response_object(&JsonDeserializer::<T>::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCategory, TransportError};
    use crate::execution::interceptor::{RequestTransformer, ResponseTransformer};
    use crate::testing::{MockClient, manager_with, manager_with_client, respond_with};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn successful_round_trip() {
        let manager = manager_with(respond_with(200, "hello"));
        let (response, body) = manager
            .get("https://example.com/greeting")
            .unwrap()
            .response_string()
            .unwrap();
        assert_eq!(response.status_code(), 200);
        assert_eq!(body, "hello");
    }

    #[test]
    fn validation_failure_keeps_the_response() {
        let manager = manager_with(respond_with(404, "missing"));
        let err = manager.get("https://example.com/x").unwrap().response().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        let mut response = err.into_response().unwrap();
        assert_eq!(&response.data().unwrap()[..], b"missing");
    }

    #[test]
    fn custom_validator_replaces_default() {
        let manager = manager_with(respond_with(404, ""));
        let (response, _) = manager
            .get("https://example.com/x")
            .unwrap()
            .valid_status(200..=499)
            .response()
            .unwrap();
        assert_eq!(response.status_code(), 404);
    }

    #[test]
    fn transport_errors_are_wrapped() {
        let client = Arc::new(MockClient::failing(|| TransportError::Connect("refused".into())));
        let manager = manager_with_client(client);
        let err = manager.get("https://example.com").unwrap().execute().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.response().is_none());
    }

    #[test]
    fn pipelines_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = manager_with(respond_with(200, ""));

        let request_log = Arc::clone(&log);
        manager.add_request_interceptor(Arc::new(
            move |request: Request, next: &RequestTransformer| -> Result<Request, RequestError> {
                request_log.lock().unwrap().push("request");
                next(request)
            },
        ));
        let response_log = Arc::clone(&log);
        manager.add_response_interceptor(Arc::new(
            move |request: &mut Request,
                  response: Response,
                  next: &ResponseTransformer|
                  -> Result<Response, RequestError> {
                response_log.lock().unwrap().push("response");
                next(request, response)
            },
        ));

        let validator_log = Arc::clone(&log);
        manager
            .get("https://example.com")
            .unwrap()
            .validate(move |_| {
                validator_log.lock().unwrap().push("validate");
                true
            })
            .execute()
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["request", "response", "validate"]);
    }

    #[test]
    fn cancelled_requests_do_not_reach_the_client() {
        let client = Arc::new(MockClient::new(|_| respond_with(200, "")));
        let manager = manager_with_client(client.clone());
        let interrupted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&interrupted);

        let request = manager
            .get("https://example.com")
            .unwrap()
            .interrupt(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        request.cancel_handle().cancel();

        let err = request.execute().unwrap_err();
        assert!(err.caused_by_interruption());
        assert_eq!(interrupted.load(Ordering::SeqCst), 1);
        assert!(client.calls().is_empty());
    }

    #[test]
    fn request_pipeline_errors_skip_the_client() {
        let client = Arc::new(MockClient::new(|_| respond_with(200, "")));
        let mut manager = manager_with_client(client.clone());
        manager.add_request_interceptor(Arc::new(
            |_: Request, _: &RequestTransformer| -> Result<Request, RequestError> {
                Err(RequestError::configuration("nope"))
            },
        ));
        assert!(manager.get("https://example.com").unwrap().execute().is_err());
        assert!(client.calls().is_empty());
    }

    #[test]
    fn json_responses() {
        let manager = manager_with(respond_with(200, r#"{"ok":true}"#));
        let (_, value) = manager
            .get("https://example.com")
            .unwrap()
            .response_json::<serde_json::Value>()
            .unwrap();
        assert_eq!(value["ok"], serde_json::Value::Bool(true));
    }

    #[test]
    #[tracing_test::traced_test]
    fn failures_before_sending_are_traced() {
        let client = Arc::new(MockClient::new(|_| respond_with(200, "")));
        let manager = manager_with_client(client.clone());
        let err = manager
            .post("https://example.com/upload")
            .unwrap()
            .multipart()
            .header("Content-Type", "multipart/form-data")
            .execute()
            .unwrap_err();

        assert!(matches!(err, RequestError::BoundaryMissing { .. }));
        assert!(logs_contain("stage=failed"));
        assert!(!logs_contain("stage=sending"));
        assert!(client.calls().is_empty());
    }
}
