//! Podprobe CLI - node-pinned diagnostic pods driven over exec streams

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use podprobe::config::Settings;
use std::io;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "podprobe")]
#[command(author, version, about = "Node-pinned diagnostic pods and exec probes", long_about = None)]
struct Cli {
    /// Verbose output (can be used multiple times: -v, -vv)
    /// -v: DEBUG, -vv: TRACE
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dry-run mode: show what would be done without touching the cluster
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure a diagnostic pod exists on each target host
    Up {
        /// Target host, repeatable (defaults from config)
        #[arg(long = "host")]
        hosts: Vec<String>,

        /// Container image for the diagnostic pod
        #[arg(short, long)]
        image: Option<String>,

        /// Namespace to create pods in
        #[arg(short, long, env = "PODPROBE_NAMESPACE")]
        namespace: Option<String>,

        /// Print the generated pod manifests as YAML
        #[arg(long)]
        show_manifest: bool,
    },

    /// Send a shell command through each pod's exec stream
    Run {
        /// Command line passed to the pod's shell
        #[arg(short, long)]
        command: String,

        /// Target host, repeatable (defaults from config)
        #[arg(long = "host")]
        hosts: Vec<String>,

        /// Container image for the diagnostic pod
        #[arg(short, long)]
        image: Option<String>,

        /// Namespace to create pods in
        #[arg(short, long, env = "PODPROBE_NAMESPACE")]
        namespace: Option<String>,
    },

    /// Run timed wget probes against service IPs from each host's pod
    Probe {
        /// Probe target <ip[:port]>, repeatable; bracket IPv6 when
        /// giving a port, e.g. [fd00::1]:80
        #[arg(short, long = "target", required = true)]
        targets: Vec<String>,

        /// Target host, repeatable (defaults from config)
        #[arg(long = "host")]
        hosts: Vec<String>,

        /// Container image for the diagnostic pod
        #[arg(short, long)]
        image: Option<String>,

        /// Namespace to create pods in
        #[arg(short, long, env = "PODPROBE_NAMESPACE")]
        namespace: Option<String>,

        /// Number of probe rounds
        #[arg(short, long, default_value_t = 1)]
        rounds: u32,
    },

    /// Print an example configuration file
    Config,

    /// Generate shell completion scripts
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity level
    let log_level = match cli.verbose {
        0 => "info",  // Default
        1 => "debug", // -v
        _ => "trace", // -vv
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    // Set dry-run mode
    if cli.dry_run {
        // SAFETY: nothing else reads or writes the environment concurrently
        // this early in startup
        unsafe { std::env::set_var("PODPROBE_DRY_RUN", "1") };
        podprobe::log_info!("DRY RUN MODE: No changes will be made");
        println!();
    }

    let settings = Settings::load();
    podprobe::utils::set_color_preference(settings.behavior.colors);

    match cli.command {
        Commands::Up {
            hosts,
            image,
            namespace,
            show_manifest,
        } => {
            use podprobe::commands::up::UpOptions;
            podprobe::commands::up::up(
                UpOptions {
                    hosts: hosts_or_default(hosts, &settings),
                    image: image.unwrap_or_else(|| settings.defaults.image.clone()),
                    namespace: namespace.unwrap_or_else(|| settings.defaults.namespace.clone()),
                    show_manifest,
                },
                &settings,
            )
            .await
        }
        Commands::Run {
            command,
            hosts,
            image,
            namespace,
        } => {
            use podprobe::commands::run::RunOptions;
            podprobe::commands::run::run(
                RunOptions {
                    command,
                    hosts: hosts_or_default(hosts, &settings),
                    image: image.unwrap_or_else(|| settings.defaults.image.clone()),
                    namespace: namespace.unwrap_or_else(|| settings.defaults.namespace.clone()),
                },
                &settings,
            )
            .await
        }
        Commands::Probe {
            targets,
            hosts,
            image,
            namespace,
            rounds,
        } => {
            use podprobe::commands::probe::ProbeOptions;
            podprobe::commands::probe::probe(
                ProbeOptions {
                    targets,
                    hosts: hosts_or_default(hosts, &settings),
                    image: image.unwrap_or_else(|| settings.defaults.image.clone()),
                    namespace: namespace.unwrap_or_else(|| settings.defaults.namespace.clone()),
                    rounds,
                },
                &settings,
            )
            .await
        }
        Commands::Config => {
            print!("{}", Settings::example_config());
            Ok(())
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "podprobe", &mut io::stdout());
            Ok(())
        }
        Commands::Version => {
            println!("podprobe {}", env!("CARGO_PKG_VERSION"));
            println!("Node-pinned diagnostic pods and exec probes");
            Ok(())
        }
    }
}

fn hosts_or_default(hosts: Vec<String>, settings: &Settings) -> Vec<String> {
    if hosts.is_empty() {
        settings.defaults.hosts.clone()
    } else {
        hosts
    }
}
