//! Scripted cluster for watcher, orchestrator and verifier tests

use crate::{BootstrapRequest, ClusterCli};
use async_trait::async_trait;
use spaces_core::{Result, SpacesError};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

pub const CONVERGED: &str = r#"
machines:
  "0":
    agent-state: started
    state-server-member-status: has-vote
services:
  app:
    units:
      app/0:
        agent-state: idle
        machine: "0"
        workload-status:
          current: active
"#;

pub const PENDING: &str = r#"
machines:
  "0":
    agent-state: started
    state-server-member-status: has-vote
services:
  app:
    units:
      app/0:
        agent-state: pending
        machine: "0"
        workload-status:
          current: waiting
"#;

/// Replays scripted status documents; the last one repeats forever
#[derive(Default)]
pub struct FakeCluster {
    bootstrapped: Mutex<bool>,
    statuses: Mutex<VecDeque<Option<String>>>,
    addresses: HashMap<(String, String), String>,
    calls: Mutex<Vec<String>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bootstrapped(self) -> Self {
        *self.bootstrapped.lock().unwrap() = true;
        self
    }

    /// Queue a status document; `None` fails the fetch
    pub fn then_status(self, doc: Option<&str>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .push_back(doc.map(str::to_string));
        self
    }

    pub fn with_address(mut self, unit: &str, relation: &str, output: &str) -> Self {
        self.addresses
            .insert((unit.to_string(), relation.to_string()), output.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn status_fetches(&self) -> usize {
        self.calls().iter().filter(|c| *c == "status").count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

fn unreachable(command: &str) -> SpacesError {
    SpacesError::RemoteCommand {
        command: format!("juju {}", command),
        status: 1,
        output: "cannot connect to API".to_string(),
    }
}

#[async_trait]
impl ClusterCli for FakeCluster {
    async fn is_bootstrapped(&self) -> bool {
        *self.bootstrapped.lock().unwrap()
    }

    async fn status(&self) -> Result<String> {
        self.record("status");
        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front().flatten()
        } else {
            statuses.front().cloned().flatten()
        };
        next.ok_or_else(|| unreachable("status"))
    }

    async fn bootstrap(&self, req: &BootstrapRequest) -> Result<()> {
        self.record(format!("bootstrap {} --to {}", req.controller, req.host));
        *self.bootstrapped.lock().unwrap() = true;
        Ok(())
    }

    async fn deploy(&self, bundle: &Path) -> Result<()> {
        self.record(format!("deploy {}", bundle.display()));
        Ok(())
    }

    async fn network_get(&self, unit: &str, relation: &str) -> Result<String> {
        self.record(format!("network-get {} {}", unit, relation));
        self.addresses
            .get(&(unit.to_string(), relation.to_string()))
            .cloned()
            .ok_or_else(|| unreachable("run"))
    }

    async fn switch(&self, env: &str) -> Result<()> {
        self.record(format!("switch {}", env));
        Ok(())
    }

    async fn destroy_environment(&self, env: &str, force: bool) -> Result<()> {
        self.record(format!("destroy-environment {} force={}", env, force));
        Ok(())
    }
}
