//! MAAS network provisioning
//!
//! Reconciles segment VLANs, spaces and subnets against the MAAS inventory
//! and wires each node onto the segments its bundle slot requires.
pub mod assigner;
pub mod client;
pub mod reconciler;

#[cfg(test)]
mod testing;

pub use assigner::NodeAssigner;
pub use client::{Inventory, MaasCli};
pub use reconciler::{BoundSegment, ReconciledTopology, TopologyReconciler};
