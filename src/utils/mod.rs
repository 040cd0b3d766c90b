//! Utility modules for podprobe

pub mod dryrun;
pub mod errors;
pub mod logger;
pub mod progress;

// Re-export commonly used items
pub use errors::{display_error_and_exit, enhance_pod_error, PodprobeError};
pub use logger::{log_error, log_info, log_warn};
pub use progress::WaitProgress;

/// Apply the configured color preference to all `colored` output.
///
/// `colored` already disables itself on non-tty output; this only forces
/// colors off when the config says so.
pub fn set_color_preference(enabled: bool) {
    if !enabled {
        colored::control::set_override(false);
    }
}
