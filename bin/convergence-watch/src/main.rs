use anyhow::Result;
use clap::Parser;
use spaces_core::{DeployConfig, ShellRunner};
use spaces_juju::{ConvergenceWatcher, JujuCli, WaitMode};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(
    name = "convergence-watch",
    about = "Wait until every machine and unit in the environment is healthy"
)]
struct Args {
    /// Keep reporting transitions after the environment converges
    #[clap(long)]
    forever: bool,

    /// Seconds between polls; overrides the configuration file
    #[clap(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Deployment configuration file
    #[clap(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = DeployConfig::load(args.config.as_deref())?;
    let interval = args
        .interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.poll_interval());

    let mode = if args.forever {
        WaitMode::Forever
    } else {
        WaitMode::UntilStable
    };

    info!("Watching {} every {:?}", config.controller, interval);
    let juju = JujuCli::new(ShellRunner::new());
    let ledger = ConvergenceWatcher::new(&juju, interval).wait(mode).await;
    info!("Converged after {} transitions", ledger.len());

    Ok(())
}
