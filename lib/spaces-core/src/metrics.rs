//! Prometheus metrics for a provisioning run

use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tracing::debug;

/// Counters for remote calls and convergence polling
#[derive(Clone)]
pub struct ProvisionMetrics {
    /// Inventory requests by verb (read, create, update, ...)
    pub inventory_requests_total: CounterVec,
    /// Orchestrator CLI commands by subcommand
    pub cluster_commands_total: CounterVec,
    /// Convergence poll cycles by outcome
    pub convergence_polls_total: CounterVec,
    /// Prometheus registry for metrics
    pub registry: Arc<Registry>,
}

impl ProvisionMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let inventory_requests_total = CounterVec::new(
            Opts::new("inventory_requests_total", "MAAS API requests issued"),
            &["verb"],
        )?;

        let cluster_commands_total = CounterVec::new(
            Opts::new("cluster_commands_total", "Orchestrator commands issued"),
            &["command"],
        )?;

        let convergence_polls_total = CounterVec::new(
            Opts::new("convergence_polls_total", "Convergence poll cycles"),
            &["outcome"],
        )?;

        registry.register(Box::new(inventory_requests_total.clone()))?;
        registry.register(Box::new(cluster_commands_total.clone()))?;
        registry.register(Box::new(convergence_polls_total.clone()))?;

        debug!("Provision metrics registered");

        Ok(Self {
            inventory_requests_total,
            cluster_commands_total,
            convergence_polls_total,
            registry,
        })
    }

    pub fn record_inventory_request(&self, verb: &str) {
        self.inventory_requests_total.with_label_values(&[verb]).inc();
    }

    pub fn record_cluster_command(&self, command: &str) {
        self.cluster_commands_total.with_label_values(&[command]).inc();
    }

    pub fn record_poll(&self, outcome: &str) {
        self.convergence_polls_total.with_label_values(&[outcome]).inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
