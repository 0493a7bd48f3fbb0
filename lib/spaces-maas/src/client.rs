//! MAAS inventory client

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use spaces_api::maas::{
    Fabric, Interface, LinkSubnet, MaasRequest, Node, NodeGroup, NodeGroupInterface,
    NodeGroupInterfaceCreate, Space, SpaceCreate, SpaceUpdate, Subnet, SubnetUpdate, Vlan,
    VlanCreate, VlanInterfaceCreate,
};
use spaces_core::{CommandRunner, CommandSpec, ProvisionMetrics, Result, SpacesError};
use tracing::{debug, info};

/// The inventory operations provisioning needs
///
/// Reads return fresh snapshots; nothing is cached between calls.
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn node_groups(&self) -> Result<Vec<NodeGroup>>;

    async fn node_group_interfaces(&self, uuid: &str) -> Result<Vec<NodeGroupInterface>>;

    async fn create_node_group_interface(
        &self,
        uuid: &str,
        req: &NodeGroupInterfaceCreate,
    ) -> Result<NodeGroupInterface>;

    async fn fabrics(&self) -> Result<Vec<Fabric>>;

    async fn create_vlan(&self, fabric_id: u64, req: &VlanCreate) -> Result<Vlan>;

    async fn spaces(&self) -> Result<Vec<Space>>;

    async fn create_space(&self, req: &SpaceCreate) -> Result<Space>;

    async fn update_space(&self, id: u64, req: &SpaceUpdate) -> Result<Space>;

    async fn subnets(&self) -> Result<Vec<Subnet>>;

    async fn update_subnet(&self, id: u64, req: &SubnetUpdate) -> Result<Subnet>;

    async fn nodes(&self) -> Result<Vec<Node>>;

    async fn interfaces(&self, system_id: &str) -> Result<Vec<Interface>>;

    async fn create_vlan_interface(
        &self,
        system_id: &str,
        req: &VlanInterfaceCreate,
    ) -> Result<Interface>;

    async fn link_subnet(
        &self,
        system_id: &str,
        interface_id: u64,
        req: &LinkSubnet,
    ) -> Result<Interface>;
}

/// Inventory backed by the `maas` command-line client
pub struct MaasCli<R> {
    runner: R,
    program: String,
    profile: String,
    metrics: Option<ProvisionMetrics>,
}

impl<R: CommandRunner> MaasCli<R> {
    /// Create a client for a logged-in CLI profile
    pub fn new(runner: R, profile: impl Into<String>) -> Self {
        Self {
            runner,
            program: "maas".to_string(),
            profile: profile.into(),
            metrics: None,
        }
    }

    /// Count every request in `metrics`
    pub fn with_metrics(mut self, metrics: ProvisionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn read<T: DeserializeOwned>(&self, words: &[&str]) -> Result<T> {
        self.call("read", words, Vec::new()).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        verb: &str,
        words: &[&str],
        operands: Vec<String>,
    ) -> Result<T> {
        let spec = CommandSpec::new(&self.program)
            .arg(&self.profile)
            .args(words.iter().copied())
            .args(operands)
            .quiet();

        if verb == "read" {
            debug!("{}", spec);
        } else {
            info!("{}", spec);
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_inventory_request(verb);
        }

        let out = self.runner.run(&spec).await?.into_success(&spec)?;
        serde_json::from_str(&out).map_err(|source| SpacesError::Decode {
            command: spec.to_string(),
            source,
        })
    }
}

#[async_trait]
impl<R: CommandRunner> Inventory for MaasCli<R> {
    async fn node_groups(&self) -> Result<Vec<NodeGroup>> {
        self.read(&["node-groups", "list"]).await
    }

    async fn node_group_interfaces(&self, uuid: &str) -> Result<Vec<NodeGroupInterface>> {
        self.read(&["node-group-interfaces", "list", uuid]).await
    }

    async fn create_node_group_interface(
        &self,
        uuid: &str,
        req: &NodeGroupInterfaceCreate,
    ) -> Result<NodeGroupInterface> {
        self.call("create", &["node-group-interfaces", "new", uuid], req.to_operands()).await
    }

    async fn fabrics(&self) -> Result<Vec<Fabric>> {
        self.read(&["fabrics", "read"]).await
    }

    async fn create_vlan(&self, fabric_id: u64, req: &VlanCreate) -> Result<Vlan> {
        let fabric_id = fabric_id.to_string();
        self.call("create", &["vlans", "create", fabric_id.as_str()], req.to_operands()).await
    }

    async fn spaces(&self) -> Result<Vec<Space>> {
        self.read(&["spaces", "read"]).await
    }

    async fn create_space(&self, req: &SpaceCreate) -> Result<Space> {
        self.call("create", &["spaces", "create"], req.to_operands()).await
    }

    async fn update_space(&self, id: u64, req: &SpaceUpdate) -> Result<Space> {
        let id = id.to_string();
        self.call("update", &["space", "update", id.as_str()], req.to_operands()).await
    }

    async fn subnets(&self) -> Result<Vec<Subnet>> {
        self.read(&["subnets", "read"]).await
    }

    async fn update_subnet(&self, id: u64, req: &SubnetUpdate) -> Result<Subnet> {
        let id = id.to_string();
        self.call("update", &["subnet", "update", id.as_str()], req.to_operands()).await
    }

    async fn nodes(&self) -> Result<Vec<Node>> {
        self.read(&["nodes", "list"]).await
    }

    async fn interfaces(&self, system_id: &str) -> Result<Vec<Interface>> {
        self.read(&["interfaces", "read", system_id]).await
    }

    async fn create_vlan_interface(
        &self,
        system_id: &str,
        req: &VlanInterfaceCreate,
    ) -> Result<Interface> {
        self.call("create", &["interfaces", "create-vlan", system_id], req.to_operands()).await
    }

    async fn link_subnet(
        &self,
        system_id: &str,
        interface_id: u64,
        req: &LinkSubnet,
    ) -> Result<Interface> {
        let interface_id = interface_id.to_string();
        self.call(
            "link",
            &["interface", "link-subnet", system_id, interface_id.as_str()],
            req.to_operands(),
        )
        .await
    }
}
