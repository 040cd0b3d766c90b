//! Kubernetes-backed implementation of the pod backend
//!
//! Thin wrapper over `kube::Api<Pod>`; exec streams ride the API server's
//! websocket subprotocol (`ws` feature).

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams, PostParams};
use kube::{Client, Config};

use crate::k8s::backend::{BackendError, PodBackend, PodLookup, PodPhase};
use crate::k8s::exec::ExecSession;
use crate::k8s::manifest::PodManifest;

#[derive(Clone)]
pub struct KubeBackend {
    pods: Api<Pod>,
}

impl KubeBackend {
    /// Build a backend from ambient credentials (kubeconfig or in-cluster),
    /// scoped to `namespace`. The resolved config is threaded straight into
    /// the client; nothing is stored process-wide.
    pub async fn connect(namespace: &str) -> Result<Self, BackendError> {
        let config = Config::infer().await?;
        let client = Client::try_from(config)?;
        Ok(Self::new(client, namespace))
    }

    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            pods: Api::namespaced(client, namespace),
        }
    }
}

#[async_trait]
impl PodBackend for KubeBackend {
    async fn lookup(&self, name: &str) -> Result<PodLookup, BackendError> {
        match self.pods.get(name).await {
            Ok(pod) => Ok(PodLookup::Found(Box::new(pod))),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(PodLookup::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, manifest: &PodManifest) -> Result<Pod, BackendError> {
        let pod = self
            .pods
            .create(&PostParams::default(), &manifest.to_pod())
            .await?;
        Ok(pod)
    }

    async fn phase(&self, name: &str) -> Result<PodPhase, BackendError> {
        let pod = self.pods.get(name).await?;
        let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
        Ok(PodPhase::parse(phase))
    }

    async fn connect(&self, name: &str, command: &[String]) -> Result<ExecSession, BackendError> {
        let params = AttachParams::default()
            .stdin(true)
            .stdout(true)
            .stderr(true)
            .tty(false);

        let mut attached = self.pods.exec(name, command.to_vec(), &params).await?;

        let stdin = attached
            .stdin()
            .ok_or(BackendError::StreamUnavailable("stdin"))?;
        let stdout = attached
            .stdout()
            .ok_or(BackendError::StreamUnavailable("stdout"))?;
        let stderr = attached.stderr();

        // The attached process drives its message loop on a spawned task, so
        // only the stream halves need to stay alive here.
        Ok(ExecSession::new(
            Box::new(stdin),
            Box::new(stdout),
            stderr.map(|s| Box::new(s) as Box<dyn tokio::io::AsyncRead + Send + Unpin>),
        ))
    }
}

impl std::fmt::Debug for KubeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeBackend").finish_non_exhaustive()
    }
}
