//! Per-session state shared by the two form actions.
//!
//! Holds the latest processed file and the latest debug output. Each is simply overwritten by
//! whichever action completes last; a superseded processed file is released as soon as nothing
//! else holds it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::controller::DebugOutput;
use crate::download::ProcessedFile;

#[derive(Debug, Default)]
pub struct Session {
    result: Mutex<Option<Arc<ProcessedFile>>>,
    debug_output: Mutex<Option<DebugOutput>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new processed file, releasing the previous one.
    pub fn replace_result(&self, file: ProcessedFile) -> Arc<ProcessedFile> {
        let file = Arc::new(file);
        let previous = self.result.lock().replace(file.clone());
        if let Some(previous) = previous {
            tracing::debug!(filename = %previous.filename(), "Superseding previous processed file");
        }
        file
    }

    pub fn current_result(&self) -> Option<Arc<ProcessedFile>> {
        self.result.lock().clone()
    }

    pub fn set_debug_output(&self, output: DebugOutput) {
        *self.debug_output.lock() = Some(output);
    }

    pub fn debug_output(&self) -> Option<DebugOutput> {
        self.debug_output.lock().clone()
    }

    /// Drop everything held by the session. Called when the session ends.
    pub fn clear(&self) {
        self.result.lock().take();
        self.debug_output.lock().take();
    }
}
