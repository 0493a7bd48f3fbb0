//! Convergence watching
//!
//! Polls cluster status on a fixed interval until every machine, container
//! and unit is healthy in the same cycle. Fetch failures and incomplete
//! status documents are expected while the control plane boots; both only
//! cause another poll.

use crate::{ClusterCli, ConvergenceLedger};
use spaces_api::ClusterStatus;
use spaces_core::ProvisionMetrics;
use std::time::Duration;
use tracing::{info, warn};

const STARTED: &str = "started";
const IDLE: &str = "idle";
const HAS_VOTE: &str = "has-vote";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitMode {
    UntilStable,
    /// Keep polling and reporting transitions after convergence
    Forever,
}

/// Result of a single poll cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Stable,
    Unstable,
    FetchFailed,
    Incomplete,
}

impl PollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollOutcome::Stable => "stable",
            PollOutcome::Unstable => "unstable",
            PollOutcome::FetchFailed => "fetch_failed",
            PollOutcome::Incomplete => "incomplete",
        }
    }
}

pub struct ConvergenceWatcher<'a, C: ?Sized> {
    cli: &'a C,
    interval: Duration,
    metrics: Option<ProvisionMetrics>,
}

impl<'a, C: ClusterCli + ?Sized> ConvergenceWatcher<'a, C> {
    pub fn new(cli: &'a C, interval: Duration) -> Self {
        Self {
            cli,
            interval,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: ProvisionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sleep-then-poll until stable, or indefinitely in [`WaitMode::Forever`]
    pub async fn wait(&self, mode: WaitMode) -> ConvergenceLedger {
        let mut ledger = ConvergenceLedger::new();
        loop {
            tokio::time::sleep(self.interval).await;

            let outcome = self.poll_once(&mut ledger).await;
            if let Some(metrics) = &self.metrics {
                metrics.record_poll(outcome.as_str());
            }

            if outcome == PollOutcome::Stable && mode == WaitMode::UntilStable {
                info!("Cluster converged");
                return ledger;
            }
        }
    }

    /// Fetch and assess one status sample
    pub async fn poll_once(&self, ledger: &mut ConvergenceLedger) -> PollOutcome {
        let raw = match self.cli.status().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Status fetch failed: {}", e);
                return PollOutcome::FetchFailed;
            }
        };

        match ClusterStatus::parse(&raw) {
            Ok(status) if assess(&status, ledger) => PollOutcome::Stable,
            Ok(_) => PollOutcome::Unstable,
            Err(e) => {
                warn!("{}, continuing", e);
                PollOutcome::Incomplete
            }
        }
    }
}

/// Record every entity in `ledger` and report whether all are healthy
pub fn assess(status: &ClusterStatus, ledger: &mut ConvergenceLedger) -> bool {
    let mut stable = true;

    for machine in &status.machines {
        let state = machine.agent_state.as_deref().unwrap_or("unknown");
        ledger.observe(&machine.id, state);
        if state != STARTED {
            stable = false;
            continue;
        }

        if let Some(vote) = machine.vote.as_deref().filter(|v| !v.is_empty()) {
            if vote != HAS_VOTE {
                stable = false;
                continue;
            }
        }

        for container in &machine.containers {
            let state = container.agent_state.as_deref().unwrap_or("unknown");
            ledger.observe(&container.id, state);
            if state != STARTED {
                stable = false;
            }
        }
    }

    for unit in &status.units {
        let key = format!("{} {}", unit.machine, unit.name);
        ledger.observe(&key, &unit.state);
        ledger.observe(
            &format!("{} workload-status", key),
            unit.workload_message.as_deref().unwrap_or(""),
        );
        if unit.state != STARTED && unit.state != IDLE {
            stable = false;
        }
    }

    stable
}
