//! Topology reconciliation
//!
//! Brings the inventory's cluster interfaces, VLANs, spaces and subnet
//! bindings into agreement with the configured segments. Stages run in a
//! fixed order because later stages read identifiers the inventory assigned
//! in earlier ones:
//!
//! 1. cluster interfaces  -> [`ClusterController`]
//! 2. fabric VLANs        -> [`ManagedFabric`]
//! 3. spaces
//! 4. identifier lookup   -> [`ResolvedTopology`]
//! 5. subnet binding      -> [`ReconciledTopology`]
//!
//! Only missing or mismatched objects are touched, so a converged inventory
//! sees no mutating calls at all.

use crate::Inventory;
use spaces_api::maas::{NodeGroupInterfaceCreate, SpaceCreate, SpaceUpdate, SubnetUpdate, VlanCreate};
use spaces_core::config::{DefaultSpace, DeployConfig};
use spaces_core::{Result, Segment, SpacesError};
use std::collections::HashMap;
use tracing::{debug, info};

/// The cluster controller whose interfaces were reconciled
#[derive(Clone, Debug)]
pub struct ClusterController {
    pub uuid: String,
}

/// The pre-existing fabric carrying the segment VLANs
#[derive(Clone, Debug)]
pub struct ManagedFabric {
    pub id: u64,
    pub name: String,
}

/// Segments with the inventory identifiers of their VLAN and space
#[derive(Clone, Debug)]
pub struct ResolvedTopology {
    segments: Vec<(Segment, u64, u64)>,
}

/// A segment bound to its inventory VLAN, space and subnet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundSegment {
    pub segment: Segment,
    /// Inventory id of the VLAN (not the 802.1Q tag)
    pub vlan_id: u64,
    pub space_id: u64,
    pub subnet_id: u64,
}

/// The reconciled segment set
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconciledTopology {
    segments: Vec<BoundSegment>,
}

impl ReconciledTopology {
    pub fn get(&self, name: &str) -> Option<&BoundSegment> {
        self.segments.iter().find(|b| b.segment.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundSegment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Idempotently reconciles segments against the inventory
pub struct TopologyReconciler<'a, I: ?Sized> {
    inventory: &'a I,
    managed_fabric: String,
    default_space: DefaultSpace,
}

impl<'a, I: Inventory + ?Sized> TopologyReconciler<'a, I> {
    pub fn new(inventory: &'a I, managed_fabric: impl Into<String>, default_space: DefaultSpace) -> Self {
        Self {
            inventory,
            managed_fabric: managed_fabric.into(),
            default_space,
        }
    }

    pub fn from_config(inventory: &'a I, config: &DeployConfig) -> Self {
        Self::new(inventory, config.managed_fabric.clone(), config.default_space.clone())
    }

    /// Run every stage in order
    pub async fn reconcile(&self, segments: &[Segment]) -> Result<ReconciledTopology> {
        let controller = self.ensure_cluster_interfaces(segments).await?;
        debug!("Cluster controller {} interfaces reconciled", controller.uuid);

        let fabric = self.ensure_vlans(segments).await?;
        self.ensure_spaces(segments).await?;
        let resolved = self.resolve_identifiers(&fabric, segments).await?;
        let topology = self.bind_subnets(resolved).await?;

        info!("Reconciled {} segments", topology.len());
        Ok(topology)
    }

    /// Stage 1: a managed cluster interface per segment
    pub async fn ensure_cluster_interfaces(&self, segments: &[Segment]) -> Result<ClusterController> {
        let uuid = self
            .inventory
            .node_groups()
            .await?
            .into_iter()
            .next()
            .map(|g| g.uuid)
            .ok_or(SpacesError::MissingInventoryObject {
                kind: "cluster controller",
                name: "master".to_string(),
            })?;

        let existing: Vec<String> = self
            .inventory
            .node_group_interfaces(&uuid)
            .await?
            .into_iter()
            .map(|i| i.name)
            .collect();

        for segment in segments {
            if existing.iter().any(|name| name == segment.interface()) {
                debug!("Cluster interface {} already present", segment.interface());
                continue;
            }
            info!("Creating cluster interface {}", segment.interface());
            self.inventory
                .create_node_group_interface(&uuid, &NodeGroupInterfaceCreate::from(segment))
                .await?;
        }

        Ok(ClusterController { uuid })
    }

    /// Stage 2: a VLAN per segment on the managed fabric
    pub async fn ensure_vlans(&self, segments: &[Segment]) -> Result<ManagedFabric> {
        let fabric = self
            .inventory
            .fabrics()
            .await?
            .into_iter()
            .find(|f| f.name == self.managed_fabric)
            .ok_or_else(|| SpacesError::ManagedFabricNotFound(self.managed_fabric.clone()))?;

        for segment in segments {
            if fabric.vlan_named(segment.name()).is_some() {
                debug!("VLAN {} already on fabric {}", segment.name(), fabric.name);
                continue;
            }
            info!("Creating VLAN {} (vid {})", segment.name(), segment.vid());
            self.inventory
                .create_vlan(
                    fabric.id,
                    &VlanCreate {
                        name: segment.name().to_string(),
                        vid: segment.vid(),
                    },
                )
                .await?;
        }

        Ok(ManagedFabric {
            id: fabric.id,
            name: fabric.name,
        })
    }

    /// Stage 3: rename the default space, then a space per segment
    pub async fn ensure_spaces(&self, segments: &[Segment]) -> Result<()> {
        let spaces = self.inventory.spaces().await?;

        if let Some(sentinel) = spaces.iter().find(|s| s.name == self.default_space.sentinel) {
            info!(
                "Renaming space {} to {}",
                self.default_space.sentinel, self.default_space.name
            );
            self.inventory
                .update_space(
                    sentinel.id,
                    &SpaceUpdate {
                        name: self.default_space.name.clone(),
                    },
                )
                .await?;
        }

        for segment in segments {
            if spaces.iter().any(|s| s.name == segment.name()) {
                continue;
            }
            info!("Creating space {}", segment.name());
            self.inventory
                .create_space(&SpaceCreate {
                    name: segment.name().to_string(),
                })
                .await?;
        }

        Ok(())
    }

    /// Stage 4: capture the VLAN and space identifiers the inventory assigned
    pub async fn resolve_identifiers(
        &self,
        fabric: &ManagedFabric,
        segments: &[Segment],
    ) -> Result<ResolvedTopology> {
        let fabric = self
            .inventory
            .fabrics()
            .await?
            .into_iter()
            .find(|f| f.id == fabric.id)
            .ok_or_else(|| SpacesError::ManagedFabricNotFound(fabric.name.clone()))?;
        let vlans_by_name: HashMap<&str, u64> =
            fabric.vlans.iter().map(|v| (v.name.as_str(), v.id)).collect();

        let spaces = self.inventory.spaces().await?;
        let spaces_by_name: HashMap<&str, u64> =
            spaces.iter().map(|s| (s.name.as_str(), s.id)).collect();

        let mut resolved = Vec::with_capacity(segments.len());
        for segment in segments {
            let vlan_id = *vlans_by_name.get(segment.name()).ok_or_else(|| {
                SpacesError::MissingInventoryObject {
                    kind: "VLAN",
                    name: segment.name().to_string(),
                }
            })?;
            let space_id = *spaces_by_name.get(segment.name()).ok_or_else(|| {
                SpacesError::MissingInventoryObject {
                    kind: "space",
                    name: segment.name().to_string(),
                }
            })?;
            debug!("Segment {} has VLAN id {} and space id {}", segment.name(), vlan_id, space_id);
            resolved.push((segment.clone(), vlan_id, space_id));
        }

        Ok(ResolvedTopology { segments: resolved })
    }

    /// Stage 5: bind each segment's pre-existing subnet to its VLAN and space
    pub async fn bind_subnets(&self, resolved: ResolvedTopology) -> Result<ReconciledTopology> {
        let subnets = self.inventory.subnets().await?;

        let mut bound = Vec::with_capacity(resolved.segments.len());
        for (segment, vlan_id, space_id) in resolved.segments {
            let cidr = segment.cidr();
            let subnet = subnets
                .iter()
                .find(|s| s.cidr == cidr)
                .ok_or_else(|| SpacesError::SubnetNotFound(cidr.clone()))?;

            if subnet.vlan.name != segment.name() {
                info!("Binding subnet {} to VLAN and space {}", cidr, segment.name());
                self.inventory
                    .update_subnet(
                        subnet.id,
                        &SubnetUpdate {
                            vlan: vlan_id,
                            space: space_id,
                            name: segment.name().to_string(),
                        },
                    )
                    .await?;
            }

            bound.push(BoundSegment {
                subnet_id: subnet.id,
                segment,
                vlan_id,
                space_id,
            });
        }

        Ok(ReconciledTopology { segments: bound })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{default_segments, FakeInventory};

    fn reconciler(inventory: &FakeInventory) -> TopologyReconciler<'_, FakeInventory> {
        TopologyReconciler::new(inventory, "managed", DefaultSpace::default())
    }

    #[tokio::test]
    async fn test_reconcile_creates_missing_objects() {
        let inventory = FakeInventory::lab(0);
        let topology = reconciler(&inventory)
            .reconcile(&default_segments())
            .await
            .unwrap();

        assert_eq!(topology.len(), 3);
        let state = inventory.snapshot();

        let iface_names: Vec<&str> = state
            .node_group_interfaces
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(iface_names, vec!["eth0", "enp2s0.10", "enp2s0.11", "enp2s0.12"]);

        let vlan_names: Vec<&str> = state.fabrics[0].vlans.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(vlan_names, vec!["untagged", "internal", "public", "db"]);

        let space_names: Vec<&str> = state.spaces.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(space_names, vec!["default", "internal", "public", "db"]);

        let db = topology.get("db").unwrap();
        let subnet = state.subnets.iter().find(|s| s.id == db.subnet_id).unwrap();
        assert_eq!(subnet.cidr, "192.168.12.0/24");
        assert_eq!(subnet.vlan.id, db.vlan_id);
        assert_eq!(subnet.vlan.vid, 12);
        assert_eq!(subnet.space.as_deref(), Some("db"));
        assert_eq!(subnet.name, "db");
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let inventory = FakeInventory::lab(0);
        let segments = default_segments();

        let first = reconciler(&inventory).reconcile(&segments).await.unwrap();
        assert!(!inventory.mutations().is_empty());
        let after_first = format!("{:?}", inventory.snapshot());

        inventory.clear_calls();
        let second = reconciler(&inventory).reconcile(&segments).await.unwrap();

        assert!(inventory.mutations().is_empty(), "{:?}", inventory.mutations());
        assert_eq!(first, second);
        assert_eq!(after_first, format!("{:?}", inventory.snapshot()));
    }

    #[tokio::test]
    async fn test_default_space_renamed_once() {
        let inventory = FakeInventory::lab(0);
        reconciler(&inventory).reconcile(&default_segments()).await.unwrap();
        let renames = inventory
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("space update"))
            .count();
        assert_eq!(renames, 1);
    }

    #[tokio::test]
    async fn test_missing_fabric_aborts_before_spaces_and_subnets() {
        let inventory = FakeInventory::lab(0);
        inventory.edit(|s| s.fabrics[0].name = "fabric-0".to_string());

        let err = reconciler(&inventory)
            .reconcile(&default_segments())
            .await
            .unwrap_err();

        assert!(matches!(err, SpacesError::ManagedFabricNotFound(ref name) if name == "managed"));
        assert!(err.is_precondition());
        assert!(inventory
            .calls()
            .iter()
            .all(|c| !c.starts_with("space") && !c.starts_with("subnet")));
    }

    #[tokio::test]
    async fn test_missing_subnet_is_fatal() {
        let inventory = FakeInventory::lab(0);
        inventory.edit(|s| s.subnets.retain(|sub| sub.cidr != "192.168.11.0/24"));

        let err = reconciler(&inventory)
            .reconcile(&default_segments())
            .await
            .unwrap_err();
        assert!(matches!(err, SpacesError::SubnetNotFound(ref cidr) if cidr == "192.168.11.0/24"));
    }

    #[tokio::test]
    async fn test_subnet_already_bound_is_left_alone() {
        let inventory = FakeInventory::lab(0);
        let segments = default_segments();
        reconciler(&inventory).reconcile(&segments).await.unwrap();

        inventory.clear_calls();
        let topology = reconciler(&inventory).reconcile(&segments[..1]).await.unwrap();
        assert_eq!(topology.len(), 1);
        assert!(!inventory.calls().iter().any(|c| c.starts_with("subnet update")));
    }
}
