//! Cluster status document
//!
//! The raw document shape differs between orchestrator versions and is
//! routinely incomplete while the control plane boots. [`ClusterStatus::parse`]
//! normalizes it into typed values or reports [`Incomplete`], which callers
//! treat as "not ready yet" rather than as a failure.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// The status document lacked something the readiness check needs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("incomplete status: {0}")]
pub struct Incomplete(pub String);

/// Normalized cluster status
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterStatus {
    pub machines: Vec<MachineStatus>,
    pub units: Vec<UnitStatus>,
}

/// A machine and the containers it hosts
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MachineStatus {
    pub id: String,
    pub agent_state: Option<String>,
    /// Controller vote membership, present only on controller machines
    pub vote: Option<String>,
    pub containers: Vec<ContainerStatus>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContainerStatus {
    pub id: String,
    pub agent_state: Option<String>,
}

/// A workload unit of a deployed service
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitStatus {
    pub service: String,
    pub name: String,
    pub machine: String,
    pub state: String,
    pub workload_message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawStatus {
    machines: Option<BTreeMap<String, RawMachine>>,
    #[serde(alias = "applications")]
    services: Option<BTreeMap<String, RawService>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawMachine {
    agent_state: Option<String>,
    juju_status: Option<RawStatusInfo>,
    #[serde(alias = "controller-member-status")]
    state_server_member_status: Option<String>,
    #[serde(default)]
    containers: Option<BTreeMap<String, RawMachine>>,
}

impl RawMachine {
    fn resolved_state(&self) -> Option<String> {
        self.agent_state
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.juju_status.as_ref().and_then(|s| s.current.clone()))
    }
}

#[derive(Deserialize)]
struct RawService {
    units: Option<BTreeMap<String, RawUnit>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawUnit {
    machine: Option<String>,
    agent_state: Option<String>,
    #[serde(alias = "juju-status")]
    agent_status: Option<RawStatusInfo>,
    workload_status: Option<RawStatusInfo>,
}

#[derive(Deserialize)]
struct RawStatusInfo {
    current: Option<String>,
    message: Option<String>,
}

impl ClusterStatus {
    /// Parse a YAML status document
    pub fn parse(raw: &str) -> Result<Self, Incomplete> {
        let raw: RawStatus =
            serde_yaml::from_str(raw).map_err(|e| Incomplete(format!("unparseable: {}", e)))?;

        let machines = raw
            .machines
            .ok_or_else(|| Incomplete("missing machines".to_string()))?
            .into_iter()
            .map(|(id, m)| MachineStatus {
                agent_state: m.resolved_state(),
                vote: m.state_server_member_status.clone(),
                containers: m
                    .containers
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(cid, c)| ContainerStatus {
                        agent_state: c.resolved_state(),
                        id: cid,
                    })
                    .collect(),
                id,
            })
            .collect();

        let services = raw
            .services
            .ok_or_else(|| Incomplete("missing services".to_string()))?;

        let mut units = Vec::new();
        for (service, svc) in services {
            let Some(service_units) = svc.units else {
                continue;
            };
            for (name, unit) in service_units {
                units.push(Self::parse_unit(&service, name, unit)?);
            }
        }

        Ok(Self { machines, units })
    }

    fn parse_unit(service: &str, name: String, unit: RawUnit) -> Result<UnitStatus, Incomplete> {
        let machine = unit
            .machine
            .ok_or_else(|| Incomplete(format!("unit {} has no machine", name)))?;

        // Older agents report agent-state; newer ones nest it under agent-status.
        let state = unit
            .agent_state
            .filter(|s| !s.is_empty())
            .or_else(|| unit.agent_status.and_then(|s| s.current))
            .ok_or_else(|| Incomplete(format!("unit {} has no agent status", name)))?;

        let workload = unit
            .workload_status
            .ok_or_else(|| Incomplete(format!("unit {} has no workload-status", name)))?;

        Ok(UnitStatus {
            service: service.to_string(),
            name,
            machine,
            state,
            workload_message: workload.message.filter(|m| !m.is_empty()),
        })
    }
}
