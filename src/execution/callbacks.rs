//! Callback-style execution on the manager's executor.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use url::Url;

use super::task::RequestTask;
use crate::deserialize::{ResponseDeserializable, ResponseOf};
use crate::error::RequestError;
use crate::http::{Request, Response};
use crate::utils::CancelHandle;

/// How a callback-style execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The success callback was scheduled.
    Succeeded,
    /// The failure callback was scheduled.
    Failed,
    /// The request was interrupted; no callback was scheduled.
    Interrupted,
}

#[derive(Default)]
struct Completion {
    outcome: Mutex<Option<Outcome>>,
    ready: Condvar,
}

impl Completion {
    fn complete(&self, outcome: Outcome) {
        let mut slot = self.outcome.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(outcome);
        }
        self.ready.notify_all();
    }
}

/// Completes the handle when dropped, including while unwinding.
struct CompletionGuard {
    completion: Arc<Completion>,
    outcome: Outcome,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.completion.complete(self.outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Handle to a request running on the manager's executor.
#[derive(Clone)]
pub struct CancellableRequest {
    url: Url,
    cancel: CancelHandle,
    completion: Arc<Completion>,
}

impl CancellableRequest {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request cancellation. The failure callback is not invoked for a
    /// cancelled request; interrupt callbacks are.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the execution finished, whatever the outcome.
    pub fn is_done(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        *self.completion.outcome.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Block until the execution finishes.
    pub fn join(&self) -> Outcome {
        let mut slot = self.completion.outcome.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(outcome) = *slot {
                return outcome;
            }
            slot = self
                .completion
                .ready
                .wait(slot)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Block until the execution finishes or `timeout` elapses.
    pub fn join_timeout(&self, timeout: Duration) -> Option<Outcome> {
        let slot = self.completion.outcome.lock().unwrap_or_else(|e| e.into_inner());
        let (slot, _) = self
            .completion
            .ready
            .wait_timeout_while(slot, timeout, |outcome| outcome.is_none())
            .unwrap_or_else(|e| e.into_inner());
        *slot
    }
}

impl fmt::Debug for CancellableRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellableRequest")
            .field("url", &self.url.as_str())
            .field("cancelled", &self.is_cancelled())
            .field("outcome", &self.outcome())
            .finish()
    }
}

/// Callback-style execution.
impl Request {
    /// Execute on the manager's executor, deserialize, and report through
    /// callbacks run on the callback executor.
    pub fn response_with<D, S, F>(
        self,
        deserializer: D,
        on_success: S,
        on_failure: F,
    ) -> CancellableRequest
    where
        D: ResponseDeserializable + 'static,
        D::Output: Send + 'static,
        S: FnOnce(Response, D::Output) + Send + 'static,
        F: FnOnce(RequestError) + Send + 'static,
    {
        self.response_result(deserializer, move |result| match result {
            Ok((response, value)) => on_success(response, value),
            Err(error) => on_failure(error),
        })
    }

    /// Like [`Request::response_with`], with a single handler taking the result.
    pub fn response_result<D, H>(self, deserializer: D, handler: H) -> CancellableRequest
    where
        D: ResponseDeserializable + 'static,
        D::Output: Send + 'static,
        H: FnOnce(Result<ResponseOf<D::Output>, RequestError>) + Send + 'static,
    {
        let handle = CancellableRequest {
            url: self.url().clone(),
            cancel: self.cancel_handle().clone(),
            completion: Arc::new(Completion::default()),
        };
        let completion = Arc::clone(&handle.completion);
        let options = self.execution_options().clone();
        let callback_executor = Arc::clone(&options.callback_executor);

        options.submit(Box::new(move || {
            let mut guard = CompletionGuard {
                completion,
                outcome: Outcome::Failed,
            };
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                RequestTask::new(self)
                    .call()
                    .and_then(|response| deserializer.deserialize(response))
            }))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                tracing::error!(target: "courier::task", %message, "request execution panicked");
                Err(RequestError::state(format!("request execution panicked: {message}")))
            });
            guard.outcome = match &result {
                Ok(_) => Outcome::Succeeded,
                Err(e) if e.caused_by_interruption() => Outcome::Interrupted,
                Err(_) => Outcome::Failed,
            };
            if guard.outcome != Outcome::Interrupted {
                callback_executor.execute(Box::new(move || handler(result)));
            }
        }));

        handle
    }
}
