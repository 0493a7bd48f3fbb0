use anyhow::Result;
use clap::{Parser, Subcommand};
use prepared::Prepared;
use spaces_core::{DeployConfig, ProvisionMetrics, ShellRunner};
use spaces_juju::{BindingVerifier, BootstrapRequest, ClusterCli, DeploymentOrchestrator, JujuCli};
use spaces_maas::{MaasCli, NodeAssigner, TopologyReconciler};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod prepared;

#[derive(Debug, Parser)]
#[clap(
    name = "spaces-deploy",
    about = "Provision MAAS network spaces and deploy a bundle bound to them"
)]
struct Args {
    /// Deployment configuration file; built-in defaults when omitted
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Switch to this environment before running the command
    #[clap(long, global = true, value_name = "ENV")]
    switch: Option<String>,

    /// Write Prometheus metrics to this file on exit
    #[clap(long, global = true)]
    metrics_file: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Provision, bootstrap, deploy and check bindings
    Up,
    /// Reconcile spaces and node interfaces, print the bootstrap node
    Provision,
    /// Report whether each binding's address is inside its segment
    Check,
    /// Destroy an environment
    Destroy {
        #[clap(long)]
        force: bool,
        #[clap(value_name = "ENV")]
        env: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = DeployConfig::load(args.config.as_deref())?;
    let metrics = ProvisionMetrics::new()?;

    let result = run(&args, config, &metrics).await;

    if let Some(path) = &args.metrics_file {
        std::fs::write(path, metrics.gather()?)?;
        info!("Metrics written to {}", path.display());
    }
    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: &Args, config: DeployConfig, metrics: &ProvisionMetrics) -> Result<()> {
    let juju = JujuCli::new(ShellRunner::new()).with_metrics(metrics.clone());

    if let Some(env) = &args.switch {
        juju.switch(env).await?;
    }

    match &args.command {
        Command::Destroy { force, env } => {
            juju.destroy_environment(env, *force).await?;
        }
        Command::Provision => {
            let prepared = Prepared::new(config)?;
            let bootstrap = provision(&prepared, metrics).await?;
            println!("{}", bootstrap);
        }
        Command::Check => {
            let prepared = Prepared::new(config)?;
            check(&juju, &prepared).await;
        }
        Command::Up => {
            let prepared = Prepared::new(config)?;
            let bootstrap = provision(&prepared, metrics).await?;

            let request = BootstrapRequest {
                controller: prepared.config.controller.clone(),
                cloud: prepared.config.cloud.clone(),
                host: bootstrap,
            };
            DeploymentOrchestrator::new(&juju, prepared.config.poll_interval())
                .with_metrics(metrics.clone())
                .ensure_deployed(&request, &prepared.config.bundle)
                .await?;

            check(&juju, &prepared).await;
        }
    }

    Ok(())
}

/// Reconcile the topology and wire the nodes; returns the bootstrap hostname
async fn provision(prepared: &Prepared, metrics: &ProvisionMetrics) -> Result<String> {
    let maas = MaasCli::new(ShellRunner::new(), &prepared.config.maas_profile)
        .with_metrics(metrics.clone());

    let topology = TopologyReconciler::from_config(&maas, &prepared.config)
        .reconcile(&prepared.segments)
        .await?;
    let bootstrap = NodeAssigner::new(&maas, prepared.managed_network)
        .assign(&prepared.plan, &topology)
        .await?;

    info!("Provisioned {} segments, bootstrap node {}", topology.len(), bootstrap);
    Ok(bootstrap)
}

async fn check<C: ClusterCli>(juju: &C, prepared: &Prepared) {
    let reports = BindingVerifier::new(juju, &prepared.segments)
        .verify(&prepared.bundle)
        .await;
    for report in &reports {
        println!("{}", report);
    }
    let ok = reports.iter().filter(|r| r.is_ok()).count();
    info!("{} of {} bindings in their segment", ok, reports.len());
}
