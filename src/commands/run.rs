//! Run command: send an ad-hoc shell command through each pod's exec stream

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::k8s::{KubeBackend, PodBackend, PodHandle, PodTimings};
use crate::utils::{dryrun, errors};

pub struct RunOptions {
    pub command: String,
    pub hosts: Vec<String>,
    pub image: String,
    pub namespace: String,
}

pub async fn run(opts: RunOptions, settings: &Settings) -> Result<()> {
    let shell = parse_shell(&settings.defaults.shell)?;

    if dryrun::is_dry_run() {
        let actions: Vec<String> = opts
            .hosts
            .iter()
            .map(|host| {
                format!(
                    "Send '{}' to '{}' in pod '{}-{}'",
                    opts.command, settings.defaults.shell, opts.image, host
                )
            })
            .collect();
        dryrun::log_actions(&actions);
        return Ok(());
    }

    let backend = KubeBackend::connect(&opts.namespace)
        .await
        .context("Failed to build Kubernetes client")?;

    let ensured = super::ensure_all(
        &backend,
        &opts.hosts,
        &opts.image,
        &settings.defaults.affinity_key,
        PodTimings::from(&settings.timing),
        settings.behavior.show_progress,
    )
    .await?;

    let mut handles = match ensured {
        Ok(handles) => handles,
        Err(failure) => errors::display_error_and_exit(errors::enhance_pod_error(
            &failure.pod,
            &failure.host,
            failure.error,
        )),
    };

    for handle in &mut handles {
        handle
            .open_connection(&shell)
            .await
            .with_context(|| format!("Failed to open exec stream to {}", handle.name()))?;
    }

    send_to_all(&mut handles, &opts.command).await;

    for handle in &mut handles {
        handle.close_connection().await.ok();
    }

    Ok(())
}

/// Send one command to every connected handle, printing the first output
/// chunk from each. Per-host failures are reported and skipped.
pub(crate) async fn send_to_all<B: PodBackend>(handles: &mut [PodHandle<B>], command: &str) {
    for handle in handles {
        match handle.send(command).await {
            Ok(output) => print!("{}", output),
            Err(e) => crate::log_warn!("{}: {}", handle.name(), e),
        }
    }
}

/// Split the configured shell into an argv for the exec subprotocol
pub(crate) fn parse_shell(shell: &str) -> Result<Vec<String>> {
    let argv =
        shell_words::split(shell).with_context(|| format!("Invalid shell command: {}", shell))?;
    anyhow::ensure!(!argv.is_empty(), "Shell command must not be empty");
    Ok(argv)
}
