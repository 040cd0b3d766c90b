//! Configuration file support for podprobe

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub timing: Timing,

    #[serde(default)]
    pub behavior: Behavior,
}

/// Default values for common operations
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Defaults {
    /// Target hosts, matched against the node affinity label values
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Node label key used in the required node-affinity expression
    #[serde(default = "default_affinity_key")]
    pub affinity_key: String,

    /// Shell started inside the pod for exec sessions
    #[serde(default = "default_shell")]
    pub shell: String,
}

/// Intervals and timeouts for polling loops
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Timing {
    /// Seconds between pod phase checks while waiting for scheduling
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds to wait for a freshly created pod to leave Pending
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,

    /// Seconds between stream polls while waiting for command output
    #[serde(default = "default_send_tick_secs")]
    pub send_tick_secs: u64,

    /// Seconds to wait for any command output before giving up
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

/// Behavior settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Behavior {
    #[serde(default = "default_true")]
    pub show_progress: bool,

    #[serde(default = "default_true")]
    pub colors: bool,
}

// Default value functions
fn default_hosts() -> Vec<String> {
    vec!["master".to_string(), "worker1".to_string()]
}

fn default_image() -> String {
    "busybox".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_affinity_key() -> String {
    "dedicated".to_string()
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_ready_timeout_secs() -> u64 {
    120
}

fn default_send_tick_secs() -> u64 {
    1
}

fn default_send_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            image: default_image(),
            namespace: default_namespace(),
            affinity_key: default_affinity_key(),
            shell: default_shell(),
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            ready_timeout_secs: default_ready_timeout_secs(),
            send_tick_secs: default_send_tick_secs(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            show_progress: default_true(),
            colors: default_true(),
        }
    }
}

impl Settings {
    /// Load settings from file or return defaults
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_file() {
            Self::load_from_file(&path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// Find config file in standard locations
    /// Priority:
    /// 1. .podprobe.toml in current directory
    /// 2. ~/.config/podprobe/config.toml (XDG config directory)
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory
        let local_config = PathBuf::from(".podprobe.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("podprobe").join("config.toml");
            if xdg_config.exists() {
                return Some(xdg_config);
            }
        }

        None
    }

    /// Generate example config file content
    pub fn example_config() -> String {
        let example = Settings::default();
        let header = "# podprobe configuration file\n\
                      # Place this file at ~/.config/podprobe/config.toml or .podprobe.toml in your project\n\n";

        match toml::to_string_pretty(&example) {
            Ok(config) => format!("{}{}", header, config),
            Err(_) => {
                // Fallback in case serialization fails
                r#"# podprobe configuration file
# Place this file at ~/.config/podprobe/config.toml or .podprobe.toml in your project

[defaults]
hosts = ["master", "worker1"]
image = "busybox"
namespace = "default"
affinity_key = "dedicated"
shell = "/bin/sh"

[timing]
poll_interval_secs = 1
ready_timeout_secs = 120
send_tick_secs = 1
send_timeout_secs = 30

[behavior]
show_progress = true
colors = true
"#
                .to_string()
            }
        }
    }
}
