//! User-facing progress output.
//!
//! Separate from `tracing`: this is what the operator watching the build
//! sees, routed through whatever console the pipeline host owns.

use parking_lot::Mutex;

/// Output sink supplied by the pipeline host.
pub trait Ui: Send + Sync {
    /// Headline for a step.
    fn say(&self, message: &str);

    /// Detail line under the current step.
    fn message(&self, message: &str);

    fn error(&self, message: &str);
}

/// Collects every line. Used by tests and by hosts that render output later.
#[derive(Debug, Default)]
pub struct RecordingUi {
    lines: Mutex<Vec<String>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines so far, prefixed with `say: `, `message: ` or `error: `.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    fn push(&self, level: &str, message: &str) {
        self.lines.lock().push(format!("{level}: {message}"));
    }
}

impl Ui for RecordingUi {
    fn say(&self, message: &str) {
        self.push("say", message);
    }

    fn message(&self, message: &str) {
        self.push("message", message);
    }

    fn error(&self, message: &str) {
        self.push("error", message);
    }
}
