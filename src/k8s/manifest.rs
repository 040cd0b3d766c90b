//! Typed pod manifest construction
//!
//! Builds the diagnostic pod spec: a keep-alive container pinned to one node
//! through a required node-affinity expression, tolerating every taint so it
//! can land on control-plane nodes too.

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{
    Affinity, Container, NodeAffinity, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm,
    Pod, PodSpec, Toleration,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("image must not be empty")]
    EmptyImage,
    #[error("host must not be empty")]
    EmptyHost,
    #[error("affinity key must not be empty")]
    EmptyAffinityKey,
    #[error("derived pod name '{0}' is not a valid DNS-1123 label")]
    InvalidName(String),
}

/// Container name inside the diagnostic pod
const CONTAINER_NAME: &str = "sleep";

/// Keep-alive loop so the pod stays Running between exec sessions
const KEEP_ALIVE: &str = "while true;do date;sleep 5; done";

/// Declarative description of one diagnostic pod.
///
/// Invariant: the pod name always equals `<image>-<host>`, with any
/// registry prefix and tag stripped from the image part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodManifest {
    name: String,
    image: String,
    host: String,
    affinity_key: String,
}

impl PodManifest {
    pub fn new(image: &str, host: &str, affinity_key: &str) -> Result<Self, ManifestError> {
        if image.is_empty() {
            return Err(ManifestError::EmptyImage);
        }
        if host.is_empty() {
            return Err(ManifestError::EmptyHost);
        }
        if affinity_key.is_empty() {
            return Err(ManifestError::EmptyAffinityKey);
        }

        let name = format!("{}-{}", image_base(image), host);
        if !is_dns1123_label(&name) {
            return Err(ManifestError::InvalidName(name));
        }

        Ok(Self {
            name,
            image: image.to_string(),
            host: host.to_string(),
            affinity_key: affinity_key.to_string(),
        })
    }

    /// Derived pod name, `<image>-<host>`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Render the full Pod object submitted to the API server
    pub fn to_pod(&self) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: CONTAINER_NAME.to_string(),
                    image: Some(self.image.clone()),
                    args: Some(vec![
                        "/bin/sh".to_string(),
                        "-c".to_string(),
                        KEEP_ALIVE.to_string(),
                    ]),
                    ..Default::default()
                }],
                restart_policy: Some("Always".to_string()),
                affinity: Some(Affinity {
                    node_affinity: Some(NodeAffinity {
                        required_during_scheduling_ignored_during_execution: Some(NodeSelector {
                            node_selector_terms: vec![NodeSelectorTerm {
                                match_expressions: Some(vec![NodeSelectorRequirement {
                                    key: self.affinity_key.clone(),
                                    operator: "In".to_string(),
                                    values: Some(vec![self.host.clone()]),
                                }]),
                                ..Default::default()
                            }],
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                tolerations: Some(vec![Toleration {
                    operator: Some("Exists".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Render the manifest as YAML for display
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.to_pod()).context("Failed to serialize pod manifest")
    }
}

/// Strip registry prefix and tag/digest from an image reference.
/// `quay.io/org/busybox:1.36` becomes `busybox`.
fn image_base(image: &str) -> &str {
    let base = image.rsplit('/').next().unwrap_or(image);
    let base = base.split(':').next().unwrap_or(base);
    base.split('@').next().unwrap_or(base)
}

/// RFC 1123 label: lowercase alphanumerics and '-', alphanumeric at both
/// ends, at most 63 characters.
fn is_dns1123_label(name: &str) -> bool {
    if name.is_empty() || name.len() > 63 {
        return false;
    }
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let valid_ends = name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name.ends_with(|c: char| c.is_ascii_alphanumeric());
    valid_chars && valid_ends
}
