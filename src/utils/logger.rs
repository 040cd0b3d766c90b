//! Operator-visible log output, routed through tracing
//!
//! Commands report progress with these macros so verbosity flags and
//! RUST_LOG filtering apply to everything the tool prints about pods.

use std::fmt::Display;

/// Emit an informational message
pub fn log_info<T: Display>(msg: T) {
    tracing::info!("{}", msg);
}

/// Emit a warning, e.g. a per-host send failure that does not stop the run
pub fn log_warn<T: Display>(msg: T) {
    tracing::warn!("{}", msg);
}

/// Emit an error message
pub fn log_error<T: Display>(msg: T) {
    tracing::error!("{}", msg);
}

/// Format-string convenience over [`log_info`]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::utils::logger::log_info(format!($($arg)*))
    };
}

/// Format-string convenience over [`log_warn`]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::utils::logger::log_warn(format!($($arg)*))
    };
}

/// Format-string convenience over [`log_error`]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::utils::logger::log_error(format!($($arg)*))
    };
}
