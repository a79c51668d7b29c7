//! Request execution.
//!
//! - `options`: per-request execution configuration
//! - `interceptor`: interceptor traits and pipeline composition
//! - `interceptors`: built-in interceptors (parameter encoding, redirects, logging)
//! - `task`: the request task and blocking execution
//! - `callbacks`: callback-style execution with cancellable handles
//! - `suspendable`: async execution
//! - `executor` / `environment`: where work and callbacks run

pub mod callbacks;
pub mod environment;
pub mod executor;
pub mod interceptor;
pub mod interceptors;
pub mod options;
pub mod progress;
mod suspendable;
pub mod task;

pub use callbacks::{CancellableRequest, Outcome};
pub use environment::{DefaultEnvironment, Environment};
pub use executor::{Executor, InlineExecutor, Job, RuntimeExecutor, WorkerRuntime};
pub use interceptor::{
    Interceptors, RequestInterceptor, RequestTransformer, ResponseInterceptor,
    ResponseTransformer, compose_request, compose_response,
};
pub use options::{ExecutionOptions, InterruptCallback, ResponseValidator};
pub use progress::{Progress, ProgressCallback};
pub use task::{ExecutionStage, RequestTask};
