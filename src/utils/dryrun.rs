//! Dry-run mode utilities

use colored::Colorize;
use std::env;

/// Check if dry-run mode is enabled
pub fn is_dry_run() -> bool {
    env::var("PODPROBE_DRY_RUN").is_ok()
}

/// Log multiple dry-run actions as a numbered list
pub fn log_actions(actions: &[String]) {
    if !is_dry_run() {
        return;
    }

    println!(
        "{}",
        "[DRY RUN] Would perform the following actions:"
            .cyan()
            .bold()
    );
    println!();

    for (i, action) in actions.iter().enumerate() {
        println!("  {}. {}", i + 1, action);
    }

    println!();
    println!("{}", "No changes were made (--dry-run mode)".yellow());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_follows_env_var() {
        // SAFETY: no other test in this binary touches this variable
        unsafe { env::remove_var("PODPROBE_DRY_RUN") };
        assert!(!is_dry_run());

        unsafe { env::set_var("PODPROBE_DRY_RUN", "1") };
        assert!(is_dry_run());
        unsafe { env::remove_var("PODPROBE_DRY_RUN") };
    }
}
