//! Post-deployment binding checks
//!
//! Diagnostic only: every mismatch is reported, none fails the run.

use crate::ClusterCli;
use spaces_api::Bundle;
use spaces_core::Segment;
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// Where a unit's bound address landed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    InAssignedSegment,
    /// Inside a configured segment, but not the bound one
    InOtherSegment(String),
    NotInAnySegment,
    /// The unit reported no IPv4 address for the relation
    NoAddress,
}

/// One line of the verification report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingReport {
    pub unit: String,
    pub relation: String,
    pub segment: String,
    pub address: Option<Ipv4Addr>,
    pub verdict: Verdict,
}

impl BindingReport {
    pub fn is_ok(&self) -> bool {
        self.verdict == Verdict::InAssignedSegment
    }
}

impl fmt::Display for BindingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let address = self
            .address
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(f, "{} {} {} ", self.unit, self.relation, address)?;
        match &self.verdict {
            Verdict::InAssignedSegment => write!(f, "in {}", self.segment),
            Verdict::InOtherSegment(other) => {
                write!(f, "in {} (bound to {})", other, self.segment)
            }
            Verdict::NotInAnySegment => write!(f, "not in any segment"),
            Verdict::NoAddress => write!(f, "has no address"),
        }
    }
}

pub struct BindingVerifier<'a, C: ?Sized> {
    cli: &'a C,
    segments: &'a [Segment],
}

impl<'a, C: ClusterCli + ?Sized> BindingVerifier<'a, C> {
    pub fn new(cli: &'a C, segments: &'a [Segment]) -> Self {
        Self { cli, segments }
    }

    /// Check every named binding of every unit in `bundle`
    pub async fn verify(&self, bundle: &Bundle) -> Vec<BindingReport> {
        let mut reports = Vec::new();
        for (service, spec) in &bundle.services {
            for index in 0..spec.num_units {
                let unit = format!("{}/{}", service, index);
                for (relation, segment) in &spec.bindings {
                    if relation.is_empty() {
                        debug!("{}: default binding has no relation to query", unit);
                        continue;
                    }
                    let report = self.check(&unit, relation, segment).await;
                    if report.is_ok() {
                        info!("{}", report);
                    } else {
                        warn!("{}", report);
                    }
                    reports.push(report);
                }
            }
        }
        reports
    }

    async fn check(&self, unit: &str, relation: &str, segment: &str) -> BindingReport {
        let address = match self.cli.network_get(unit, relation).await {
            Ok(output) => primary_address(&output),
            Err(e) => {
                debug!("network-get {} on {} failed: {}", relation, unit, e);
                None
            }
        };
        BindingReport {
            unit: unit.to_string(),
            relation: relation.to_string(),
            segment: segment.to_string(),
            address,
            verdict: classify(address, segment, self.segments),
        }
    }
}

/// First output line that is an IPv4 address
pub fn primary_address(output: &str) -> Option<Ipv4Addr> {
    output.lines().find_map(|line| line.trim().parse().ok())
}

pub fn classify(address: Option<Ipv4Addr>, assigned: &str, segments: &[Segment]) -> Verdict {
    let Some(address) = address else {
        return Verdict::NoAddress;
    };
    match segments.iter().find(|s| s.contains_host(address)) {
        Some(s) if s.name() == assigned => Verdict::InAssignedSegment,
        Some(s) => Verdict::InOtherSegment(s.name().to_string()),
        None => Verdict::NotInAnySegment,
    }
}
