//! Node sub-interface assignment
//!
//! Nodes are matched to plan slots in inventory listing order. Every
//! non-bootstrap node gets a VLAN sub-interface per segment of its slot,
//! parented on the interface that reaches the managed network, and every
//! VLAN interface is then linked to the subnet of its segment's space.

use crate::{Inventory, ReconciledTopology};
use ipnetwork::Ipv4Network;
use spaces_api::maas::{Interface, InterfaceKind, LinkSubnet, Node, Subnet, VlanInterfaceCreate};
use spaces_core::{AssignmentPlan, MachineSlot, Result, SpacesError};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub struct NodeAssigner<'a, I: ?Sized> {
    inventory: &'a I,
    managed_network: Ipv4Network,
}

impl<'a, I: Inventory + ?Sized> NodeAssigner<'a, I> {
    pub fn new(inventory: &'a I, managed_network: Ipv4Network) -> Self {
        Self {
            inventory,
            managed_network,
        }
    }

    /// Attach and link segment sub-interfaces; returns the bootstrap node's hostname
    pub async fn assign(&self, plan: &AssignmentPlan, topology: &ReconciledTopology) -> Result<String> {
        let subnets = self.inventory.subnets().await?;
        let managed_cidr = self.managed_network.to_string();
        let managed_subnet = subnets
            .iter()
            .find(|s| s.cidr == managed_cidr)
            .map(|s| s.id)
            .ok_or(SpacesError::SubnetNotFound(managed_cidr))?;

        let nodes = self.inventory.nodes().await?;
        if nodes.is_empty() {
            return Err(SpacesError::NoBootstrapNode);
        }
        if nodes.len() < plan.machine_count() {
            return Err(SpacesError::NotEnoughNodes {
                required: plan.machine_count(),
                available: nodes.len(),
            });
        }

        let mut bootstrap = None;
        for (slot, node) in plan.slots().iter().zip(&nodes) {
            if slot.is_bootstrap() {
                info!("Bootstrap node is {}", node.hostname);
                bootstrap = Some(node.hostname.clone());
                continue;
            }
            self.attach_segments(node, slot, managed_subnet, topology).await?;
        }

        for node in &nodes {
            self.link_vlan_interfaces(node, &subnets).await?;
        }

        bootstrap
            .filter(|hostname| !hostname.is_empty())
            .ok_or(SpacesError::NoBootstrapNode)
    }

    async fn attach_segments(
        &self,
        node: &Node,
        slot: &MachineSlot,
        managed_subnet: u64,
        topology: &ReconciledTopology,
    ) -> Result<()> {
        let interfaces = self.inventory.interfaces(&node.system_id).await?;
        let parent = interfaces
            .iter()
            .find(|i| i.is_linked_to(managed_subnet))
            .ok_or_else(|| SpacesError::ManagedNetworkNotFound(node.system_id.clone()))?;
        let present: Vec<u64> = interfaces
            .iter()
            .filter_map(|i| i.vlan.as_ref().map(|v| v.id))
            .collect();

        for name in &slot.segments {
            let bound = topology
                .get(name)
                .ok_or_else(|| SpacesError::UnknownSegment(name.clone()))?;
            if present.contains(&bound.vlan_id) {
                debug!("{} already has an interface on {}", node.hostname, name);
                continue;
            }
            info!("Adding {} interface to {} on {}", name, node.hostname, parent.name);
            self.inventory
                .create_vlan_interface(
                    &node.system_id,
                    &VlanInterfaceCreate {
                        parent: parent.id,
                        vlan: bound.vlan_id,
                    },
                )
                .await?;
        }
        Ok(())
    }

    async fn link_vlan_interfaces(&self, node: &Node, subnets: &[Subnet]) -> Result<()> {
        let by_space: HashMap<&str, u64> = subnets
            .iter()
            .filter_map(|s| s.space.as_deref().map(|space| (space, s.id)))
            .collect();

        let interfaces = self.inventory.interfaces(&node.system_id).await?;
        for iface in interfaces.iter().filter(|i| i.kind == InterfaceKind::Vlan) {
            let Some(vlan) = vlan_name(iface) else {
                continue;
            };
            if iface.has_link_named(vlan) {
                continue;
            }
            let Some(&subnet) = by_space.get(vlan) else {
                warn!("No subnet in space {} for {} on {}", vlan, iface.name, node.hostname);
                continue;
            };
            info!("Linking {} on {} to {}", iface.name, node.hostname, vlan);
            self.inventory
                .link_subnet(&node.system_id, iface.id, &LinkSubnet::auto(subnet))
                .await?;
        }
        Ok(())
    }
}

fn vlan_name(iface: &Interface) -> Option<&str> {
    iface.vlan.as_ref().map(|v| v.name.as_str()).filter(|n| !n.is_empty())
}
