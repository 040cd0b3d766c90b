//! Enhanced error types with actionable suggestions

use colored::Colorize;
use thiserror::Error;

use crate::k8s::backend::BackendError;
use crate::k8s::exec::ExecError;
use crate::k8s::pod::PodError;

/// Enhanced error with suggestions and documentation links
#[derive(Error, Debug)]
#[error("{message}")]
pub struct PodprobeError {
    pub message: String,
    pub suggestions: Vec<String>,
    pub docs_link: Option<String>,
}

impl PodprobeError {
    /// Create a new error with suggestions
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestions: Vec::new(),
            docs_link: None,
        }
    }

    /// Add a suggestion to the error
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a documentation link
    pub fn with_docs(mut self, link: impl Into<String>) -> Self {
        self.docs_link = Some(link.into());
        self
    }

    /// Display the error with suggestions
    pub fn display(&self) {
        crate::log_error!("{}", self.message);

        if !self.suggestions.is_empty() {
            println!();
            println!("{}", "Suggestions:".yellow().bold());
            for suggestion in &self.suggestions {
                println!("  {} {}", "→".blue(), suggestion);
            }
        }

        if let Some(docs) = &self.docs_link {
            println!();
            println!("{} {}", "Documentation:".cyan(), docs);
        }
    }

    // Common error patterns

    /// Unexpected API failure while looking up a pod
    pub fn lookup_failed(pod: &str, detail: &str) -> Self {
        Self::new(format!("Unknown error looking up pod '{}': {}", pod, detail))
            .suggest("Verify the cluster is reachable: kubectl cluster-info")
            .suggest("Check your kubeconfig context: kubectl config current-context")
            .suggest("Run with --verbose for the full API response")
    }

    /// Pod stayed Pending past the ready timeout
    pub fn pod_pending_timeout(pod: &str, host: &str) -> Self {
        Self::new(format!("Pod '{}' did not leave Pending in time", pod))
            .suggest(format!(
                "Check scheduling events: kubectl describe pod {}",
                pod
            ))
            .suggest(format!(
                "Verify a node carries the affinity label: kubectl get nodes -l dedicated={}",
                host
            ))
            .suggest("Increase ready_timeout_secs in the podprobe config file")
    }

    /// Exec stream is not open
    pub fn exec_not_connected(pod: &str) -> Self {
        Self::new(format!("No open exec session for pod '{}'", pod))
            .suggest("The stream may have been closed by the remote shell")
            .suggest("Re-run the command to open a fresh session")
    }

    /// Kubeconfig could not be resolved
    pub fn kubeconfig_not_found() -> Self {
        Self::new("Could not resolve cluster credentials")
            .suggest("Check that ~/.kube/config exists or KUBECONFIG is set")
            .suggest("If running in-cluster, verify the service account mount")
    }

    /// Permission denied error
    pub fn permission_denied(operation: &str) -> Self {
        Self::new(format!("Permission denied: {}", operation))
            .suggest("Verify you can create pods and use pods/exec in this namespace")
            .suggest("Check RBAC: kubectl auth can-i create pods")
    }

    /// Invalid probe target
    pub fn invalid_target(target: &str) -> Self {
        Self::new(format!("Invalid probe target: '{}'", target))
            .suggest("Targets must be <ip> or <ip>:<port>, e.g. 10.96.2.1:80")
            .suggest("Bracket IPv6 addresses when giving a port, e.g. [fd00::1]:80")
    }
}

/// Helper to display error and exit
pub fn display_error_and_exit(error: PodprobeError) -> ! {
    error.display();
    std::process::exit(1);
}

/// Convert a pod-handle error into an operator-facing PodprobeError
pub fn enhance_pod_error(pod: &str, host: &str, err: PodError) -> PodprobeError {
    match err {
        PodError::PendingTimeout { .. } => PodprobeError::pod_pending_timeout(pod, host),
        PodError::Exec(ExecError::NotConnected) | PodError::Exec(ExecError::AlreadyOpen) => {
            PodprobeError::exec_not_connected(pod)
        }
        PodError::Backend(BackendError::Config(e)) => {
            PodprobeError::kubeconfig_not_found().suggest(e.to_string())
        }
        PodError::Backend(e) => {
            let detail = e.to_string();
            if detail.contains("Forbidden") || detail.contains("Unauthorized") {
                PodprobeError::permission_denied(&format!("pod operations on '{}'", pod))
            } else {
                PodprobeError::lookup_failed(pod, &detail)
            }
        }
        other => PodprobeError::new(other.to_string())
            .suggest("Run with --verbose for more details"),
    }
}
