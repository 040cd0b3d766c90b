//! Kubernetes operations

pub mod backend;
pub mod client;
pub mod exec;
pub mod manifest;
pub mod pod;
pub mod wait;

pub use backend::{BackendError, PodBackend, PodLookup, PodPhase};
pub use client::KubeBackend;
pub use exec::{ExecError, ExecSession};
pub use manifest::{ManifestError, PodManifest};
pub use pod::{PodError, PodHandle, PodTimings};
