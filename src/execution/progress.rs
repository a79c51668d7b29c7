use std::sync::Arc;

/// Progress handler: `(bytes_so_far, total_if_known)`.
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Ordered set of progress handlers.
#[derive(Clone, Default)]
pub struct Progress {
    handlers: Vec<ProgressCallback>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, handler: ProgressCallback) {
        self.handlers.push(handler);
    }

    /// Remove a previously added handler by identity.
    pub fn remove(&mut self, handler: &ProgressCallback) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|h| !Arc::ptr_eq(h, handler));
        before != self.handlers.len()
    }

    pub fn is_set(&self) -> bool {
        !self.handlers.is_empty()
    }

    pub fn invoke(&self, read: u64, total: Option<u64>) {
        for handler in &self.handlers {
            handler(read, total);
        }
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
