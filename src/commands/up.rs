//! Up command: ensure a diagnostic pod exists on each target host

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::k8s::{KubeBackend, PodManifest, PodTimings};
use crate::utils::{dryrun, errors};

pub struct UpOptions {
    pub hosts: Vec<String>,
    pub image: String,
    pub namespace: String,
    pub show_manifest: bool,
}

pub async fn up(opts: UpOptions, settings: &Settings) -> Result<()> {
    let affinity_key = &settings.defaults.affinity_key;

    if opts.show_manifest {
        for host in &opts.hosts {
            let manifest = PodManifest::new(&opts.image, host, affinity_key)?;
            println!("---");
            print!("{}", manifest.to_yaml()?);
        }
        if dryrun::is_dry_run() {
            return Ok(());
        }
    }

    if dryrun::is_dry_run() {
        let actions: Vec<String> = opts
            .hosts
            .iter()
            .map(|host| {
                format!(
                    "Ensure pod '{}-{}' pinned to {}={} in namespace '{}'",
                    opts.image, host, affinity_key, host, opts.namespace
                )
            })
            .collect();
        dryrun::log_actions(&actions);
        return Ok(());
    }

    let backend = KubeBackend::connect(&opts.namespace)
        .await
        .context("Failed to build Kubernetes client")?;

    let handles = super::ensure_all(
        &backend,
        &opts.hosts,
        &opts.image,
        affinity_key,
        PodTimings::from(&settings.timing),
        settings.behavior.show_progress,
    )
    .await?;

    match handles {
        Ok(handles) => {
            crate::log_info!("{} diagnostic pod(s) ready:", handles.len());
            for handle in &handles {
                crate::log_info!("  {} (host {})", handle.name(), handle.host());
            }
            Ok(())
        }
        Err(failure) => errors::display_error_and_exit(errors::enhance_pod_error(
            &failure.pod,
            &failure.host,
            failure.error,
        )),
    }
}
