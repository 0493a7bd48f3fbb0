//! In-memory inventory for reconciler and assigner tests

use crate::Inventory;
use async_trait::async_trait;
use spaces_api::maas::{
    Fabric, Interface, InterfaceKind, Link, LinkSubnet, Node, NodeGroup, NodeGroupInterface,
    NodeGroupInterfaceCreate, Space, SpaceCreate, SpaceUpdate, Subnet, SubnetRef, SubnetUpdate,
    Vlan, VlanCreate, VlanInterfaceCreate,
};
use spaces_core::{Result, Segment, SpacesError};
use std::sync::Mutex;

pub const MANAGED_CIDR: &str = "192.168.1.0/24";
pub const MANAGED_SUBNET_ID: u64 = 100;
const UNTAGGED_VLAN_ID: u64 = 5001;

#[derive(Clone, Debug, Default)]
pub struct State {
    pub node_group_uuid: String,
    pub node_group_interfaces: Vec<NodeGroupInterface>,
    pub fabrics: Vec<Fabric>,
    pub spaces: Vec<Space>,
    pub subnets: Vec<Subnet>,
    pub nodes: Vec<Node>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn vlan(&self, id: u64) -> Option<Vlan> {
        self.fabrics
            .iter()
            .flat_map(|f| f.vlans.iter())
            .find(|v| v.id == id)
            .cloned()
    }

    fn node_mut(&mut self, system_id: &str) -> Result<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.system_id == system_id)
            .ok_or_else(|| not_found(system_id))
    }
}

fn not_found(what: &str) -> SpacesError {
    SpacesError::RemoteCommand {
        command: format!("fake {}", what),
        status: 2,
        output: "Not Found".to_string(),
    }
}

/// Records every call and applies mutations the way MAAS does
pub struct FakeInventory {
    state: Mutex<State>,
    calls: Mutex<Vec<String>>,
}

impl FakeInventory {
    /// A prepared lab: the managed fabric, the default space, one subnet per
    /// default segment on the untagged VLAN, and `node_count` nodes uplinked
    /// on the managed network.
    pub fn lab(node_count: usize) -> Self {
        let untagged = Vlan {
            id: UNTAGGED_VLAN_ID,
            name: "untagged".to_string(),
            vid: 0,
            fabric: Some("managed".to_string()),
        };

        let subnet = |id: u64, cidr: &str| Subnet {
            id,
            name: cidr.to_string(),
            cidr: cidr.to_string(),
            vlan: untagged.clone(),
            space: Some("space-0".to_string()),
        };

        let nodes = (0..node_count)
            .map(|i| Node {
                system_id: format!("node-{}", i),
                hostname: format!("node{}.maas", i),
                interface_set: vec![Interface {
                    id: 1000 + i as u64,
                    name: "eth0".to_string(),
                    kind: InterfaceKind::Physical,
                    vlan: Some(untagged.clone()),
                    links: vec![Link {
                        id: 2000 + i as u64,
                        mode: "auto".to_string(),
                        subnet: Some(SubnetRef {
                            id: MANAGED_SUBNET_ID,
                            name: MANAGED_CIDR.to_string(),
                            cidr: MANAGED_CIDR.to_string(),
                        }),
                    }],
                }],
            })
            .collect();

        let state = State {
            node_group_uuid: "cluster-uuid".to_string(),
            node_group_interfaces: vec![NodeGroupInterface {
                name: "eth0".to_string(),
                interface: "eth0".to_string(),
                ip: Some("192.168.1.2".to_string()),
            }],
            fabrics: vec![Fabric {
                id: 1,
                name: "managed".to_string(),
                vlans: vec![untagged.clone()],
            }],
            spaces: vec![Space {
                id: 0,
                name: "space-0".to_string(),
            }],
            subnets: vec![
                subnet(MANAGED_SUBNET_ID, MANAGED_CIDR),
                subnet(110, "192.168.10.0/24"),
                subnet(111, "192.168.11.0/24"),
                subnet(112, "192.168.12.0/24"),
            ],
            nodes,
            next_id: 10_000,
        };

        Self {
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn edit(&self, f: impl FnOnce(&mut State)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn snapshot(&self) -> State {
        self.state.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that changed inventory state
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.ends_with(" read") && !c.ends_with(" list"))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

pub fn default_segments() -> Vec<Segment> {
    vec![
        Segment::plan("internal", "192.168.10.0/24", 10, "enp2s0.10").unwrap(),
        Segment::plan("public", "192.168.11.0/24", 11, "enp2s0.11").unwrap(),
        Segment::plan("db", "192.168.12.0/24", 12, "enp2s0.12").unwrap(),
    ]
}

#[async_trait]
impl Inventory for FakeInventory {
    async fn node_groups(&self) -> Result<Vec<NodeGroup>> {
        self.record("node-groups list");
        let state = self.state.lock().unwrap();
        Ok(vec![NodeGroup {
            uuid: state.node_group_uuid.clone(),
            cluster_name: "Cluster master".to_string(),
        }])
    }

    async fn node_group_interfaces(&self, uuid: &str) -> Result<Vec<NodeGroupInterface>> {
        self.record("node-group-interfaces list");
        let state = self.state.lock().unwrap();
        if uuid != state.node_group_uuid {
            return Err(not_found(uuid));
        }
        Ok(state.node_group_interfaces.clone())
    }

    async fn create_node_group_interface(
        &self,
        _uuid: &str,
        req: &NodeGroupInterfaceCreate,
    ) -> Result<NodeGroupInterface> {
        self.record(format!("node-group-interfaces new {}", req.name));
        let iface = NodeGroupInterface {
            name: req.name.clone(),
            interface: req.interface.clone(),
            ip: Some(req.ip.to_string()),
        };
        self.state
            .lock()
            .unwrap()
            .node_group_interfaces
            .push(iface.clone());
        Ok(iface)
    }

    async fn fabrics(&self) -> Result<Vec<Fabric>> {
        self.record("fabrics read");
        Ok(self.state.lock().unwrap().fabrics.clone())
    }

    async fn create_vlan(&self, fabric_id: u64, req: &VlanCreate) -> Result<Vlan> {
        self.record(format!("vlans create {}", req.name));
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let fabric = state
            .fabrics
            .iter_mut()
            .find(|f| f.id == fabric_id)
            .ok_or_else(|| not_found("fabric"))?;
        let vlan = Vlan {
            id,
            name: req.name.clone(),
            vid: req.vid,
            fabric: Some(fabric.name.clone()),
        };
        fabric.vlans.push(vlan.clone());
        Ok(vlan)
    }

    async fn spaces(&self) -> Result<Vec<Space>> {
        self.record("spaces read");
        Ok(self.state.lock().unwrap().spaces.clone())
    }

    async fn create_space(&self, req: &SpaceCreate) -> Result<Space> {
        self.record(format!("spaces create {}", req.name));
        let mut state = self.state.lock().unwrap();
        let space = Space {
            id: state.next_id(),
            name: req.name.clone(),
        };
        state.spaces.push(space.clone());
        Ok(space)
    }

    async fn update_space(&self, id: u64, req: &SpaceUpdate) -> Result<Space> {
        self.record(format!("space update {}", req.name));
        let mut state = self.state.lock().unwrap();
        let space = state
            .spaces
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("space"))?;
        let old = std::mem::replace(&mut space.name, req.name.clone());
        let space = space.clone();
        for subnet in state.subnets.iter_mut() {
            if subnet.space.as_deref() == Some(old.as_str()) {
                subnet.space = Some(req.name.clone());
            }
        }
        Ok(space)
    }

    async fn subnets(&self) -> Result<Vec<Subnet>> {
        self.record("subnets read");
        Ok(self.state.lock().unwrap().subnets.clone())
    }

    async fn update_subnet(&self, id: u64, req: &SubnetUpdate) -> Result<Subnet> {
        self.record(format!("subnet update {}", req.name));
        let mut state = self.state.lock().unwrap();
        let vlan = state.vlan(req.vlan).ok_or_else(|| not_found("vlan"))?;
        let space = state
            .spaces
            .iter()
            .find(|s| s.id == req.space)
            .map(|s| s.name.clone())
            .ok_or_else(|| not_found("space"))?;
        let subnet = state
            .subnets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("subnet"))?;
        subnet.vlan = vlan;
        subnet.space = Some(space);
        subnet.name = req.name.clone();
        Ok(subnet.clone())
    }

    async fn nodes(&self) -> Result<Vec<Node>> {
        self.record("nodes list");
        Ok(self.state.lock().unwrap().nodes.clone())
    }

    async fn interfaces(&self, system_id: &str) -> Result<Vec<Interface>> {
        self.record(format!("interfaces {} read", system_id));
        let mut state = self.state.lock().unwrap();
        Ok(state.node_mut(system_id)?.interface_set.clone())
    }

    async fn create_vlan_interface(
        &self,
        system_id: &str,
        req: &VlanInterfaceCreate,
    ) -> Result<Interface> {
        self.record(format!("interfaces create-vlan {} vlan={}", system_id, req.vlan));
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let vlan = state.vlan(req.vlan).ok_or_else(|| not_found("vlan"))?;
        let node = state.node_mut(system_id)?;
        let parent = node
            .interface_set
            .iter()
            .find(|i| i.id == req.parent)
            .ok_or_else(|| not_found("parent interface"))?;
        let iface = Interface {
            id,
            name: format!("{}.{}", parent.name, vlan.vid),
            kind: InterfaceKind::Vlan,
            vlan: Some(vlan),
            links: Vec::new(),
        };
        node.interface_set.push(iface.clone());
        Ok(iface)
    }

    async fn link_subnet(
        &self,
        system_id: &str,
        interface_id: u64,
        req: &LinkSubnet,
    ) -> Result<Interface> {
        self.record(format!(
            "interface link-subnet {} {} subnet={}",
            system_id, interface_id, req.subnet
        ));
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let subnet = state
            .subnets
            .iter()
            .find(|s| s.id == req.subnet)
            .cloned()
            .ok_or_else(|| not_found("subnet"))?;
        let node = state.node_mut(system_id)?;
        let iface = node
            .interface_set
            .iter_mut()
            .find(|i| i.id == interface_id)
            .ok_or_else(|| not_found("interface"))?;
        iface.links.push(Link {
            id,
            mode: req.mode.to_string(),
            subnet: Some(SubnetRef {
                id: subnet.id,
                name: subnet.name,
                cidr: subnet.cidr,
            }),
        });
        Ok(iface.clone())
    }
}
