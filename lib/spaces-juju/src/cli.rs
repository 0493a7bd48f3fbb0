//! Orchestrator command-line client

use async_trait::async_trait;
use spaces_core::{CommandRunner, CommandSpec, ProvisionMetrics, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Hard deadline for each connectivity check
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Pause between failed connectivity checks
const CONNECT_RETRY: Duration = Duration::from_secs(5);
/// Hard deadline for the "is a controller up" check
const BOOTSTRAP_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Where and how to bootstrap the control plane
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapRequest {
    pub controller: String,
    pub cloud: String,
    /// Hostname of the node the controller is pinned to
    pub host: String,
}

/// The orchestrator operations deployment needs
#[async_trait]
pub trait ClusterCli: Send + Sync {
    /// Fast, failure-tolerant check for a running control plane
    async fn is_bootstrapped(&self) -> bool;

    /// Raw YAML status document
    async fn status(&self) -> Result<String>;

    async fn bootstrap(&self, req: &BootstrapRequest) -> Result<()>;

    async fn deploy(&self, bundle: &Path) -> Result<()>;

    /// Output of `network-get <relation> --primary-address` run on `unit`
    async fn network_get(&self, unit: &str, relation: &str) -> Result<String>;

    async fn switch(&self, env: &str) -> Result<()>;

    async fn destroy_environment(&self, env: &str, force: bool) -> Result<()>;
}

/// A typed orchestrator invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JujuCommand {
    Status,
    Bootstrap(BootstrapRequest),
    Deploy { bundle: PathBuf },
    Run { unit: String, command: String },
    Switch { env: String },
    DestroyEnvironment { env: String, force: bool },
}

impl JujuCommand {
    pub fn name(&self) -> &'static str {
        match self {
            JujuCommand::Status => "status",
            JujuCommand::Bootstrap(_) => "bootstrap",
            JujuCommand::Deploy { .. } => "deploy",
            JujuCommand::Run { .. } => "run",
            JujuCommand::Switch { .. } => "switch",
            JujuCommand::DestroyEnvironment { .. } => "destroy-environment",
        }
    }

    /// Offline commands never wait for controller connectivity
    pub fn is_offline(&self) -> bool {
        matches!(
            self,
            JujuCommand::Bootstrap(_) | JujuCommand::Switch { .. } | JujuCommand::DestroyEnvironment { .. }
        )
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.name().to_string()];
        match self {
            JujuCommand::Status => args.extend(["--format".to_string(), "yaml".to_string()]),
            JujuCommand::Bootstrap(req) => args.extend([
                req.controller.clone(),
                req.cloud.clone(),
                "--upload-tools".to_string(),
                "--to".to_string(),
                req.host.clone(),
            ]),
            JujuCommand::Deploy { bundle } => args.push(bundle.display().to_string()),
            JujuCommand::Run { unit, command } => {
                args.extend(["--unit".to_string(), unit.clone(), command.clone()])
            }
            JujuCommand::Switch { env } => args.push(env.clone()),
            JujuCommand::DestroyEnvironment { env, force } => {
                if *force {
                    args.push("--force".to_string());
                }
                args.push(env.clone());
            }
        }
        args
    }
}

/// Cluster client backed by the `juju` command-line client
pub struct JujuCli<R> {
    runner: R,
    program: String,
    connect_retry: Duration,
    metrics: Option<ProvisionMetrics>,
}

impl<R: CommandRunner> JujuCli<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            program: "juju".to_string(),
            connect_retry: CONNECT_RETRY,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: ProvisionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_connect_retry(mut self, retry: Duration) -> Self {
        self.connect_retry = retry;
        self
    }

    fn spec(&self, command: &JujuCommand) -> CommandSpec {
        CommandSpec::new(&self.program).args(command.to_args())
    }

    /// Block until `juju status` answers within the connect deadline
    pub async fn wait_for_connection(&self) -> Result<()> {
        let check = CommandSpec::new(&self.program)
            .arg("status")
            .timeout(CONNECT_TIMEOUT)
            .quiet();
        loop {
            if self.runner.run(&check).await?.is_success() {
                return Ok(());
            }
            debug!("Controller not reachable, retrying in {:?}", self.connect_retry);
            tokio::time::sleep(self.connect_retry).await;
        }
    }

    /// Run a command and return its output; non-zero exits are errors
    pub async fn execute(&self, command: &JujuCommand, quiet: bool) -> Result<String> {
        if !command.is_offline() {
            self.wait_for_connection().await?;
        }

        let mut spec = self.spec(command);
        if quiet {
            spec = spec.quiet();
        } else {
            info!("juju cmd: {}", spec.args.join(" "));
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_cluster_command(command.name());
        }

        self.runner.run(&spec).await?.into_success(&spec)
    }
}

#[async_trait]
impl<R: CommandRunner> ClusterCli for JujuCli<R> {
    async fn is_bootstrapped(&self) -> bool {
        let check = CommandSpec::new(&self.program)
            .arg("status")
            .timeout(BOOTSTRAP_CHECK_TIMEOUT)
            .quiet();
        match self.runner.run(&check).await {
            Ok(out) => out.is_success(),
            Err(e) => {
                debug!("Bootstrap check failed: {}", e);
                false
            }
        }
    }

    async fn status(&self) -> Result<String> {
        self.execute(&JujuCommand::Status, true).await
    }

    async fn bootstrap(&self, req: &BootstrapRequest) -> Result<()> {
        self.execute(&JujuCommand::Bootstrap(req.clone()), false).await?;
        Ok(())
    }

    async fn deploy(&self, bundle: &Path) -> Result<()> {
        let command = JujuCommand::Deploy {
            bundle: bundle.to_path_buf(),
        };
        self.execute(&command, false).await?;
        Ok(())
    }

    async fn network_get(&self, unit: &str, relation: &str) -> Result<String> {
        let command = JujuCommand::Run {
            unit: unit.to_string(),
            command: format!("network-get {} --primary-address", relation),
        };
        self.execute(&command, true).await
    }

    async fn switch(&self, env: &str) -> Result<()> {
        let command = JujuCommand::Switch { env: env.to_string() };
        self.execute(&command, false).await?;
        Ok(())
    }

    async fn destroy_environment(&self, env: &str, force: bool) -> Result<()> {
        let command = JujuCommand::DestroyEnvironment {
            env: env.to_string(),
            force,
        };
        self.execute(&command, false).await?;
        Ok(())
    }
}
