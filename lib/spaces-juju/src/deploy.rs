//! Bootstrap and bundle deployment

use crate::{BootstrapRequest, ClusterCli, ConvergenceWatcher, WaitMode};
use spaces_core::{ProvisionMetrics, Result};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub struct DeploymentOrchestrator<'a, C: ?Sized> {
    cli: &'a C,
    watcher: ConvergenceWatcher<'a, C>,
}

impl<'a, C: ClusterCli + ?Sized> DeploymentOrchestrator<'a, C> {
    pub fn new(cli: &'a C, poll_interval: Duration) -> Self {
        Self {
            cli,
            watcher: ConvergenceWatcher::new(cli, poll_interval),
        }
    }

    pub fn with_metrics(mut self, metrics: ProvisionMetrics) -> Self {
        self.watcher = self.watcher.with_metrics(metrics);
        self
    }

    /// Bootstrap onto `req.host` unless a controller is already up, then
    /// deploy `bundle`, waiting for convergence after each step
    pub async fn ensure_deployed(&self, req: &BootstrapRequest, bundle: &Path) -> Result<()> {
        if self.cli.is_bootstrapped().await {
            info!("Controller already bootstrapped, skipping bootstrap");
        } else {
            info!("Bootstrapping {} on {}", req.controller, req.host);
            self.cli.bootstrap(req).await?;
        }
        self.watcher.wait(WaitMode::UntilStable).await;

        info!("Deploying {}", bundle.display());
        self.cli.deploy(bundle).await?;
        self.watcher.wait(WaitMode::UntilStable).await;

        Ok(())
    }
}
