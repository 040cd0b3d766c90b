//! Command implementations for the podprobe CLI

pub mod probe;
pub mod run;
pub mod up;

use crate::k8s::{PodBackend, PodError, PodHandle, PodManifest, PodTimings};
use crate::utils::progress::WaitProgress;

/// Failure tied to the host whose pod could not be ensured
#[derive(Debug)]
pub(crate) struct HostFailure {
    pub pod: String,
    pub host: String,
    pub error: PodError,
}

/// Ensure one diagnostic pod per host, strictly in order. Stops at the
/// first failure; hosts after it are not touched.
pub(crate) async fn ensure_all<B: PodBackend + Clone>(
    backend: &B,
    hosts: &[String],
    image: &str,
    affinity_key: &str,
    timings: PodTimings,
    show_progress: bool,
) -> anyhow::Result<Result<Vec<PodHandle<B>>, HostFailure>> {
    let mut handles = Vec::with_capacity(hosts.len());

    for host in hosts {
        let manifest = PodManifest::new(image, host, affinity_key)?;
        let pod_name = manifest.name().to_string();

        let spinner = show_progress.then(|| WaitProgress::new(&pod_name, "scheduled"));
        let result = PodHandle::ensure(backend.clone(), manifest, timings).await;

        match result {
            Ok(handle) => {
                if let Some(s) = &spinner {
                    s.finish_success();
                }
                handles.push(handle);
            }
            Err(error) => {
                if let Some(s) = &spinner {
                    s.finish_error(&error.to_string());
                }
                return Ok(Err(HostFailure {
                    pod: pod_name,
                    host: host.clone(),
                    error,
                }));
            }
        }
    }

    Ok(Ok(handles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::backend::fake::FakeBackend;
    use crate::k8s::PodPhase;

    fn hosts() -> Vec<String> {
        vec!["master".to_string(), "worker1".to_string()]
    }

    #[tokio::test]
    async fn test_ensure_all_one_pod_per_host_in_order() {
        let backend = FakeBackend::new()
            .with_phases("busybox-master", &[PodPhase::Running])
            .with_phases("busybox-worker1", &[PodPhase::Running]);

        let handles = ensure_all(
            &backend,
            &hosts(),
            "busybox",
            "dedicated",
            PodTimings::default(),
            false,
        )
        .await
        .unwrap()
        .expect("all hosts ensured");

        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].name(), "busybox-master");
        assert_eq!(handles[1].name(), "busybox-worker1");

        let state = backend.state.lock().unwrap();
        assert_eq!(state.create_calls.len(), 2);
    }

    #[tokio::test]
    async fn test_ensure_all_stops_at_first_lookup_failure() {
        let backend = FakeBackend::new().failing_lookups(500);

        let failure = ensure_all(
            &backend,
            &hosts(),
            "busybox",
            "dedicated",
            PodTimings::default(),
            false,
        )
        .await
        .unwrap()
        .expect_err("lookup failure must stop the loop");

        assert_eq!(failure.host, "master");
        assert_eq!(failure.pod, "busybox-master");

        let state = backend.state.lock().unwrap();
        // Only the first host was ever looked up, nothing was created
        assert_eq!(state.lookup_calls, vec!["busybox-master"]);
        assert!(state.create_calls.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_all_rejects_bad_image() {
        let backend = FakeBackend::new();
        let err = ensure_all(
            &backend,
            &hosts(),
            "",
            "dedicated",
            PodTimings::default(),
            false,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("image"));
    }
}
