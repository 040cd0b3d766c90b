//! Progress indicators for long-running operations

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for indeterminate operations
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("Failed to create spinner template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Progress wrapper for pod-phase wait operations
pub struct WaitProgress {
    pb: ProgressBar,
    resource: String,
}

impl WaitProgress {
    pub fn new(resource: &str, condition: &str) -> Self {
        let message = format!("Waiting for {} to be {}", resource, condition);
        Self {
            pb: create_spinner(&message),
            resource: resource.to_string(),
        }
    }

    pub fn finish_success(&self) {
        self.pb
            .finish_with_message(format!("✓ {} ready", self.resource));
    }

    pub fn finish_error(&self, error: &str) {
        self.pb
            .finish_with_message(format!("✗ {} failed: {}", self.resource, error));
    }
}
