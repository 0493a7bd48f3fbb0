//! Cluster deployment and convergence
//!
//! Bootstraps the orchestrator onto the bootstrap node, deploys the bundle,
//! waits for every machine and unit to settle and checks that each binding
//! landed in its segment.
pub mod cli;
pub mod deploy;
pub mod ledger;
pub mod verify;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use cli::{BootstrapRequest, ClusterCli, JujuCli, JujuCommand};
pub use deploy::DeploymentOrchestrator;
pub use ledger::{ConvergenceLedger, LedgerEntry};
pub use verify::{BindingReport, BindingVerifier, Verdict};
pub use watcher::{ConvergenceWatcher, PollOutcome, WaitMode};
