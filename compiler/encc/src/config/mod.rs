//! Session configuration.

/// Default stack size of matcher worker threads.
///
/// Matching recurses per nesting level; deep trees grow the stack through
/// `stacker`, so this only has to cover ordinary nesting.
pub const DEFAULT_WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// How a session runs.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SessionConfig {
    /// Match documents on a worker pool.
    pub parallel: bool,
    pub worker_stack_size: usize,
    /// Cap on rude edits reported per document (0 = unlimited).
    pub max_diagnostics_per_document: usize,
}

impl SessionConfig {
    /// Everything on the calling thread, in document order.
    pub fn sequential() -> Self {
        SessionConfig {
            parallel: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_diagnostic_limit(mut self, limit: usize) -> Self {
        self.max_diagnostics_per_document = limit;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            parallel: true,
            worker_stack_size: DEFAULT_WORKER_STACK_SIZE,
            max_diagnostics_per_document: 0,
        }
    }
}
