use std::sync::Arc;

use super::executor::{Executor, InlineExecutor};

/// Host-specific hooks. Decides where user callbacks run.
pub trait Environment: Send + Sync {
    fn callback_executor(&self) -> Arc<dyn Executor>;
}

/// Runs callbacks on the worker that completed the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEnvironment;

impl Environment for DefaultEnvironment {
    fn callback_executor(&self) -> Arc<dyn Executor> {
        Arc::new(InlineExecutor)
    }
}
