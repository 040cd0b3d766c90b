//! Probe command: timed connectivity probes against service IPs
//!
//! Sends one `wget` per target through each host's pod and reports how long
//! every round trip batch took from the client side.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Instant;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::k8s::{KubeBackend, PodTimings};
use crate::utils::{dryrun, errors, PodprobeError};

pub struct ProbeOptions {
    pub targets: Vec<String>,
    pub hosts: Vec<String>,
    pub image: String,
    pub namespace: String,
    pub rounds: u32,
}

pub async fn probe(opts: ProbeOptions, settings: &Settings) -> Result<()> {
    let targets = match parse_targets(&opts.targets) {
        Ok(targets) => targets,
        Err(e) => errors::display_error_and_exit(e),
    };
    let shell = super::run::parse_shell(&settings.defaults.shell)?;

    if dryrun::is_dry_run() {
        let image = &opts.image;
        let actions: Vec<String> = opts
            .hosts
            .iter()
            .flat_map(|host| {
                targets.iter().map(move |t| {
                    format!("Probe {} from pod '{}-{}'", t, image, host)
                })
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

    for round in 1..=opts.rounds {
        let started = Instant::now();
        for target in &targets {
            let command = format!("wget -O - {}", target);
            super::run::send_to_all(&mut handles, &command).await;
        }
        crate::log_info!(
            "Round {}/{}: {} target(s) x {} host(s) in {:.3}s",
            round,
            opts.rounds,
            targets.len(),
            handles.len(),
            started.elapsed().as_secs_f64()
        );
    }

    for handle in &mut handles {
        handle.close_connection().await.ok();
    }

    Ok(())
}

/// Validate probe targets: `<ip>`, `<ipv4>:<port>`, or `[<ipv6>]:<port>`
fn parse_targets(raw: &[String]) -> Result<Vec<String>, PodprobeError> {
    if raw.is_empty() {
        return Err(PodprobeError::new("No probe targets given")
            .suggest("Pass at least one --target <ip[:port]>"));
    }

    for target in raw {
        if !is_valid_target(target) {
            return Err(PodprobeError::invalid_target(target));
        }
    }

    Ok(raw.to_vec())
}

fn is_valid_target(target: &str) -> bool {
    // Bare address, IPv4 or IPv6
    if target.parse::<IpAddr>().is_ok() {
        return true;
    }
    // Address with port; SocketAddr requires brackets around IPv6
    if target.parse::<SocketAddr>().is_ok() {
        return true;
    }
    // Bracketed IPv6 without a port, as it would appear in a wget URL
    target
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(|inner| inner.parse::<Ipv6Addr>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_targets_accepts_ip_and_ip_port() {
        let parsed = parse_targets(&targets(&["10.96.2.1", "10.96.2.1:80"])).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_parse_targets_accepts_ipv6_forms() {
        let parsed = parse_targets(&targets(&["fd00::1", "[fd00::1]", "[fd00::1]:80"])).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_parse_targets_rejects_malformed_ipv6() {
        assert!(parse_targets(&targets(&["[fd00::1"])).is_err());
        assert!(parse_targets(&targets(&["fd00::1]:80"])).is_err());
        assert!(parse_targets(&targets(&["[fd00::1]:nope"])).is_err());
        assert!(parse_targets(&targets(&["[not-an-ip]:80"])).is_err());
    }

    #[test]
    fn test_parse_targets_rejects_garbage() {
        assert!(parse_targets(&targets(&["not-an-ip"])).is_err());
        assert!(parse_targets(&targets(&["10.96.2.1:notaport"])).is_err());
        assert!(parse_targets(&targets(&["10.96.2.1:99999"])).is_err());
    }

    #[test]
    fn test_parse_targets_rejects_empty_list() {
        assert!(parse_targets(&[]).is_err());
    }
}
