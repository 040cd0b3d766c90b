//! Orchestration API seam
//!
//! Pod handles talk to the cluster through this trait so the whole
//! create/wait/exec flow can run against a fake backend in tests.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use thiserror::Error;

use crate::k8s::exec::ExecSession;
use crate::k8s::manifest::PodManifest;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    #[error("failed to infer cluster configuration: {0}")]
    Config(#[from] kube::config::InferConfigError),

    #[error("exec stream has no {0} channel")]
    StreamUnavailable(&'static str),
}

/// Typed result of a pod lookup; API failures other than not-found are
/// errors, never control flow.
#[derive(Debug)]
pub enum PodLookup {
    Found(Box<Pod>),
    NotFound,
}

/// Coarse pod lifecycle status as reported by the API server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn parse(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => Self::Pending,
            Some("Running") => Self::Running,
            Some("Succeeded") => Self::Succeeded,
            Some("Failed") => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }
}

impl std::fmt::Display for PodPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Operations podprobe needs from the cluster, namespace-scoped.
#[async_trait]
pub trait PodBackend: Send + Sync {
    /// Get a pod by name, distinguishing not-found from real failures
    async fn lookup(&self, name: &str) -> Result<PodLookup, BackendError>;

    /// Submit a pod manifest
    async fn create(&self, manifest: &PodManifest) -> Result<Pod, BackendError>;

    /// Read the current phase of a pod
    async fn phase(&self, name: &str) -> Result<PodPhase, BackendError>;

    /// Open an exec stream running `command` inside the pod, with
    /// stdin/stdout/stderr attached and no TTY
    async fn connect(&self, name: &str, command: &[String]) -> Result<ExecSession, BackendError>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory backend used by pod-handle and command tests

    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};
    use tokio::io::DuplexStream;

    #[derive(Default)]
    pub struct FakeState {
        /// Scripted phases per pod; the last entry repeats once drained
        pub phases: HashMap<String, VecDeque<PodPhase>>,
        pub existing: Vec<String>,
        pub create_calls: Vec<PodManifest>,
        pub lookup_calls: Vec<String>,
        pub phase_calls: Vec<String>,
        /// Simulated non-404 API status code returned by lookup
        pub fail_lookup_code: Option<u16>,
        /// Peer halves of the last opened exec stream
        pub exec_peers: Option<(DuplexStream, DuplexStream)>,
        pub exec_commands: Vec<Vec<String>>,
    }

    #[derive(Clone, Default)]
    pub struct FakeBackend {
        pub state: Arc<Mutex<FakeState>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a pod that already exists, in the given phase
        pub fn with_existing(self, name: &str, phase: PodPhase) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                state.existing.push(name.to_string());
                state.phases.insert(name.to_string(), VecDeque::from([phase]));
            }
            self
        }

        /// Script the sequence of phases reported after creation
        pub fn with_phases(self, name: &str, phases: &[PodPhase]) -> Self {
            self.state
                .lock()
                .unwrap()
                .phases
                .insert(name.to_string(), phases.iter().copied().collect());
            self
        }

        pub fn failing_lookups(self, code: u16) -> Self {
            self.state.lock().unwrap().fail_lookup_code = Some(code);
            self
        }

        fn api_error(code: u16) -> BackendError {
            BackendError::Api(kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".to_string(),
                message: format!("simulated status {}", code),
                reason: "Simulated".to_string(),
                code,
            }))
        }
    }

    #[async_trait]
    impl PodBackend for FakeBackend {
        async fn lookup(&self, name: &str) -> Result<PodLookup, BackendError> {
            let mut state = self.state.lock().unwrap();
            state.lookup_calls.push(name.to_string());
            if let Some(code) = state.fail_lookup_code {
                return Err(Self::api_error(code));
            }
            if state.existing.iter().any(|n| n == name) {
                Ok(PodLookup::Found(Box::new(Pod::default())))
            } else {
                Ok(PodLookup::NotFound)
            }
        }

        async fn create(&self, manifest: &PodManifest) -> Result<Pod, BackendError> {
            let mut state = self.state.lock().unwrap();
            state.create_calls.push(manifest.clone());
            state.existing.push(manifest.name().to_string());
            Ok(manifest.to_pod())
        }

        async fn phase(&self, name: &str) -> Result<PodPhase, BackendError> {
            let mut state = self.state.lock().unwrap();
            state.phase_calls.push(name.to_string());
            let script = state
                .phases
                .get_mut(name)
                .ok_or_else(|| Self::api_error(404))?;
            let phase = if script.len() > 1 {
                script.pop_front().unwrap_or(PodPhase::Unknown)
            } else {
                *script.front().unwrap_or(&PodPhase::Unknown)
            };
            Ok(phase)
        }

        async fn connect(
            &self,
            _name: &str,
            command: &[String],
        ) -> Result<ExecSession, BackendError> {
            let (stdin_w, stdin_peer) = tokio::io::duplex(4096);
            let (stdout_peer, stdout_r) = tokio::io::duplex(4096);

            let mut state = self.state.lock().unwrap();
            state.exec_commands.push(command.to_vec());
            state.exec_peers = Some((stdin_peer, stdout_peer));

            Ok(ExecSession::new(
                Box::new(stdin_w),
                Box::new(stdout_r),
                None,
            ))
        }
    }
}
