//! Everything checked locally before the first remote call

use anyhow::Result;
use ipnetwork::Ipv4Network;
use spaces_api::Bundle;
use spaces_core::{AssignmentPlan, DeployConfig, Segment};
use tracing::info;

pub struct Prepared {
    pub config: DeployConfig,
    pub segments: Vec<Segment>,
    pub managed_network: Ipv4Network,
    pub bundle: Bundle,
    pub plan: AssignmentPlan,
}

impl Prepared {
    /// Plan segments, load the bundle and validate its bindings
    pub fn new(config: DeployConfig) -> Result<Self> {
        let segments = config.segments()?;
        let managed_network = config.managed_network()?;
        let bundle = Bundle::from_file(&config.bundle)?;
        let plan = AssignmentPlan::from_bundle(&bundle);
        plan.validate_against(&segments)?;

        info!(
            "Bundle {} needs {} machines across {} segments",
            config.bundle.display(),
            plan.machine_count(),
            plan.all_segments().len()
        );

        Ok(Self {
            config,
            segments,
            managed_network,
            bundle,
            plan,
        })
    }
}
