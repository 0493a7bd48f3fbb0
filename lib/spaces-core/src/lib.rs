//! Core provisioning model for segmented MAAS deployments
//!
//! This library provides:
//! - Segment address planning from a CIDR, VLAN id and interface name
//! - The machine-slot assignment plan derived from a bundle
//! - Deployment configuration and the error taxonomy shared by all crates
//! - The command-runner seam to the external shell layer
//! - Provisioning metrics

pub mod command;
pub mod config;
pub mod error;
pub mod metrics;
pub mod plan;
pub mod segment;

pub use command::{CommandOutput, CommandRunner, CommandSpec, ShellRunner};
pub use config::DeployConfig;
pub use error::{Result, SpacesError};
pub use metrics::ProvisionMetrics;
pub use plan::{AssignmentPlan, MachineSlot, SlotRole};
pub use segment::Segment;
