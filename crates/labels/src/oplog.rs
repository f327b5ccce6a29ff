//! User-visible operation log.

use std::sync::{Arc, Mutex};

use tracing::info;

/// Append-only log of terminal operation outcomes, shared between the API
/// client and the committer. Clones write to the same underlying buffer.
#[derive(Debug, Clone, Default)]
pub struct OpLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl OpLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, line: impl Into<String>) {
        let line = line.into();
        info!("{line}");
        self.lines.lock().expect("operation log poisoned").push(line);
    }

    /// Snapshot of every line logged so far, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("operation log poisoned").clone()
    }
}
