//! apptraild — the AppTrail daemon.
//!
//! Watches Deployments, tracks the value of their version label, exports
//! every transition as an `apptrail_app_version` series, and announces
//! version changes to the configured notifiers.
//!
//! # Usage
//!
//! ```text
//! apptraild init --path apptrail.toml
//! apptraild run --config apptrail.toml --listen 0.0.0.0:8080
//! ```

mod daemon;
mod reconciler;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use apptrail_core::TrailConfig;

#[derive(Parser)]
#[command(
    name = "apptraild",
    about = "AppTrail — deployment version tracking daemon",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Watch Deployments and announce version changes.
    Run {
        /// Path to apptrail.toml. Defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address for the HTTP server (overrides [server].listen).
        #[arg(long)]
        listen: Option<String>,

        /// Only watch this namespace (overrides [watch].namespace).
        #[arg(short, long)]
        namespace: Option<String>,
    },
    /// Write a scaffolded apptrail.toml.
    Init {
        #[arg(short, long, default_value = "apptrail.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Run {
            config,
            listen,
            namespace,
        } => {
            let config = load_config(config.as_deref(), listen, namespace)?;
            daemon::run(config).await
        }
        Command::Init { path, force } => init_config(&path, force),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("info,apptraild=debug,apptrail=debug")
        });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Load the config file (if any) and apply command-line overrides.
fn load_config(
    path: Option<&std::path::Path>,
    listen: Option<String>,
    namespace: Option<String>,
) -> anyhow::Result<TrailConfig> {
    let mut config = match path {
        Some(path) => TrailConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => TrailConfig::default(),
    };

    if let Some(listen) = listen {
        config.server.listen = listen;
    }
    if let Some(namespace) = namespace {
        config.watch.namespace = Some(namespace);
    }
    config.validate()?;

    info!(
        listen = %config.server.listen,
        namespace = config.watch.namespace.as_deref().unwrap_or("*"),
        notifiers = config.notifiers.len(),
        "configuration loaded"
    );
    Ok(config)
}

fn init_config(path: &std::path::Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let text = TrailConfig::scaffold().to_toml_string()?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "config scaffold written");
    Ok(())
}
