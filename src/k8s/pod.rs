//! Pod handle: create-or-reuse a node-pinned pod and drive its exec stream

use std::time::Duration;

use thiserror::Error;

use crate::k8s::backend::{BackendError, PodBackend, PodLookup, PodPhase};
use crate::k8s::exec::{ExecError, ExecSession};
use crate::k8s::manifest::PodManifest;
use crate::k8s::wait::{poll_until, WaitError};

#[derive(Debug, Error)]
pub enum PodError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("pod '{name}' did not leave Pending within {timeout:?}")]
    PendingTimeout { name: String, timeout: Duration },
}

/// Intervals and timeouts governing a handle's polling loops
#[derive(Debug, Clone, Copy)]
pub struct PodTimings {
    pub poll_interval: Duration,
    pub ready_timeout: Duration,
    pub send_tick: Duration,
    pub send_timeout: Duration,
}

impl Default for PodTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            ready_timeout: Duration::from_secs(120),
            send_tick: Duration::from_secs(1),
            send_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&crate::config::settings::Timing> for PodTimings {
    fn from(t: &crate::config::settings::Timing) -> Self {
        Self {
            poll_interval: Duration::from_secs(t.poll_interval_secs),
            ready_timeout: Duration::from_secs(t.ready_timeout_secs),
            send_tick: Duration::from_secs(t.send_tick_secs),
            send_timeout: Duration::from_secs(t.send_timeout_secs),
        }
    }
}

/// One diagnostic pod on one node, plus its (optional) open exec session.
///
/// The exec session's lifecycle is independent of the pod's: the pod is
/// created once per (image, host) pair and never deleted by this tool.
pub struct PodHandle<B> {
    backend: B,
    manifest: PodManifest,
    timings: PodTimings,
    session: Option<ExecSession>,
}

impl<B: PodBackend> PodHandle<B> {
    /// Look up the pod named by `manifest`; create it and wait for it to
    /// leave Pending if absent. An existing pod is reused as-is without a
    /// phase wait.
    pub async fn ensure(
        backend: B,
        manifest: PodManifest,
        timings: PodTimings,
    ) -> Result<Self, PodError> {
        let name = manifest.name().to_string();

        match backend.lookup(&name).await? {
            PodLookup::Found(pod) => {
                let phase = PodPhase::parse(pod.status.as_ref().and_then(|s| s.phase.as_deref()));
                tracing::debug!("Pod {} already exists (phase {})", name, phase);
            }
            PodLookup::NotFound => {
                crate::log_info!("Pod {} does not exist. Creating it...", name);
                backend.create(&manifest).await?;
                Self::wait_for_scheduling(&backend, &name, timings).await?;
                crate::log_info!("Pod {} scheduled.", name);
            }
        }

        Ok(Self {
            backend,
            manifest,
            timings,
            session: None,
        })
    }

    /// Poll the pod's phase until it is no longer Pending
    async fn wait_for_scheduling(
        backend: &B,
        name: &str,
        timings: PodTimings,
    ) -> Result<PodPhase, PodError> {
        let condition = format!("pod {} to leave Pending", name);
        poll_until(
            &condition,
            timings.poll_interval,
            timings.ready_timeout,
            || async move {
                let phase = backend.phase(name).await?;
                Ok::<_, BackendError>((!phase.is_pending()).then_some(phase))
            },
        )
        .await
        .map_err(|e| match e {
            WaitError::TimedOut { .. } => PodError::PendingTimeout {
                name: name.to_string(),
                timeout: timings.ready_timeout,
            },
            WaitError::Check(e) => PodError::Backend(e),
        })
    }

    pub fn name(&self) -> &str {
        self.manifest.name()
    }

    pub fn host(&self) -> &str {
        self.manifest.host()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Open an exec stream running `shell` inside the pod.
    /// Fails if a session is already open instead of leaking it.
    pub async fn open_connection(&mut self, shell: &[String]) -> Result<(), PodError> {
        if self.session.is_some() {
            return Err(ExecError::AlreadyOpen.into());
        }
        let session = self.backend.connect(self.manifest.name(), shell).await?;
        self.session = Some(session);
        Ok(())
    }

    /// Send one line to the shell and return the first available chunk of
    /// output. Fails with `NotConnected` if no session is open.
    pub async fn send(&mut self, command: &str) -> Result<String, PodError> {
        let session = self.session.as_mut().ok_or(ExecError::NotConnected)?;
        let result = session
            .send(command, self.timings.send_tick, self.timings.send_timeout)
            .await;

        if matches!(result, Err(ExecError::Closed)) {
            // The remote end is gone; drop the session so later sends fail
            // with NotConnected instead of re-polling a dead stream.
            self.session = None;
        }

        Ok(result?)
    }

    /// Close the exec stream; a no-op when nothing is open
    pub async fn close_connection(&mut self) -> Result<(), PodError> {
        if let Some(session) = self.session.take() {
            session.close().await?;
        }
        Ok(())
    }
}

impl<B> std::fmt::Debug for PodHandle<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodHandle")
            .field("name", &self.manifest.name())
            .field("connected", &self.session.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::backend::fake::FakeBackend;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn manifest() -> PodManifest {
        PodManifest::new("busybox", "master", "dedicated").unwrap()
    }

    fn fast_timings() -> PodTimings {
        PodTimings {
            poll_interval: Duration::from_millis(1),
            ready_timeout: Duration::from_secs(1),
            send_tick: Duration::from_millis(10),
            send_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_ensure_creates_missing_pod() {
        let backend = FakeBackend::new().with_phases("busybox-master", &[PodPhase::Running]);

        let handle = PodHandle::ensure(backend.clone(), manifest(), fast_timings())
            .await
            .unwrap();
        assert_eq!(handle.name(), "busybox-master");

        let state = backend.state.lock().unwrap();
        assert_eq!(state.create_calls.len(), 1);
        assert_eq!(state.create_calls[0].name(), "busybox-master");
    }

    #[tokio::test]
    async fn test_ensure_reuses_existing_pod() {
        let backend = FakeBackend::new().with_existing("busybox-master", PodPhase::Running);

        PodHandle::ensure(backend.clone(), manifest(), fast_timings())
            .await
            .unwrap();

        let state = backend.state.lock().unwrap();
        assert!(state.create_calls.is_empty());
        assert_eq!(state.lookup_calls, vec!["busybox-master"]);
    }

    #[tokio::test]
    async fn test_ensure_waits_out_pending_phase() {
        let backend = FakeBackend::new().with_phases(
            "busybox-master",
            &[PodPhase::Pending, PodPhase::Pending, PodPhase::Running],
        );

        PodHandle::ensure(backend.clone(), manifest(), fast_timings())
            .await
            .unwrap();

        let state = backend.state.lock().unwrap();
        // Polled through both Pending observations before returning
        assert_eq!(state.phase_calls.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_times_out_if_stuck_pending() {
        let backend = FakeBackend::new().with_phases("busybox-master", &[PodPhase::Pending]);

        let timings = PodTimings {
            poll_interval: Duration::from_secs(1),
            ready_timeout: Duration::from_secs(5),
            ..fast_timings()
        };
        let err = PodHandle::ensure(backend, manifest(), timings)
            .await
            .unwrap_err();
        assert!(matches!(err, PodError::PendingTimeout { .. }));
    }

    #[tokio::test]
    async fn test_ensure_surfaces_unexpected_lookup_error() {
        let backend = FakeBackend::new().failing_lookups(500);

        let err = PodHandle::ensure(backend.clone(), manifest(), fast_timings())
            .await
            .unwrap_err();
        assert!(matches!(err, PodError::Backend(_)));

        let state = backend.state.lock().unwrap();
        assert!(state.create_calls.is_empty());
    }

    #[tokio::test]
    async fn test_send_writes_command_before_reading() {
        let backend = FakeBackend::new().with_existing("busybox-master", PodPhase::Running);
        let mut handle = PodHandle::ensure(backend.clone(), manifest(), fast_timings())
            .await
            .unwrap();
        handle
            .open_connection(&["/bin/sh".to_string()])
            .await
            .unwrap();

        let (mut stdin_peer, mut stdout_peer) =
            backend.state.lock().unwrap().exec_peers.take().unwrap();

        stdout_peer.write_all(b"hi\n").await.unwrap();
        let out = handle.send("echo hi").await.unwrap();
        assert_eq!(out, "hi\n");

        let mut buf = [0u8; 16];
        let n = stdin_peer.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"echo hi\n");
    }

    #[tokio::test]
    async fn test_open_twice_is_an_error() {
        let backend = FakeBackend::new().with_existing("busybox-master", PodPhase::Running);
        let mut handle = PodHandle::ensure(backend, manifest(), fast_timings())
            .await
            .unwrap();

        let shell = vec!["/bin/sh".to_string()];
        handle.open_connection(&shell).await.unwrap();
        let err = handle.open_connection(&shell).await.unwrap_err();
        assert!(matches!(err, PodError::Exec(ExecError::AlreadyOpen)));
        // The original session is still there
        assert!(handle.is_connected());
    }

    #[tokio::test]
    async fn test_send_after_close_fails_cleanly() {
        let backend = FakeBackend::new().with_existing("busybox-master", PodPhase::Running);
        let mut handle = PodHandle::ensure(backend, manifest(), fast_timings())
            .await
            .unwrap();

        handle
            .open_connection(&["/bin/sh".to_string()])
            .await
            .unwrap();
        handle.close_connection().await.unwrap();

        let err = handle.send("echo hi").await.unwrap_err();
        assert!(matches!(err, PodError::Exec(ExecError::NotConnected)));
    }

    #[tokio::test]
    async fn test_send_without_open_fails_cleanly() {
        let backend = FakeBackend::new().with_existing("busybox-master", PodPhase::Running);
        let mut handle = PodHandle::ensure(backend, manifest(), fast_timings())
            .await
            .unwrap();

        let err = handle.send("echo hi").await.unwrap_err();
        assert!(matches!(err, PodError::Exec(ExecError::NotConnected)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let backend = FakeBackend::new().with_existing("busybox-master", PodPhase::Running);
        let mut handle = PodHandle::ensure(backend, manifest(), fast_timings())
            .await
            .unwrap();

        handle
            .open_connection(&["/bin/sh".to_string()])
            .await
            .unwrap();
        handle.close_connection().await.unwrap();
        handle.close_connection().await.unwrap();
        assert!(!handle.is_connected());
    }

    #[tokio::test]
    async fn test_exec_uses_requested_shell() {
        let backend = FakeBackend::new().with_existing("busybox-master", PodPhase::Running);
        let mut handle = PodHandle::ensure(backend.clone(), manifest(), fast_timings())
            .await
            .unwrap();

        handle
            .open_connection(&["/bin/ash".to_string()])
            .await
            .unwrap();

        let state = backend.state.lock().unwrap();
        assert_eq!(state.exec_commands, vec![vec!["/bin/ash".to_string()]]);
    }
}
