use serde::{Deserialize, Deserializer, Serialize};

/// A cluster controller (node-group) managing DHCP/DNS for its interfaces
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeGroup {
    pub uuid: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub cluster_name: String,
}

/// A network interface managed by a cluster controller
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeGroupInterface {
    pub name: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub interface: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// A fabric and the VLANs carried on it
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Fabric {
    pub id: u64,

    pub name: String,

    #[serde(default)]
    pub vlans: Vec<Vlan>,
}

impl Fabric {
    /// Find a VLAN on this fabric by name
    pub fn vlan_named(&self, name: &str) -> Option<&Vlan> {
        self.vlans.iter().find(|v| v.name == name)
    }
}

/// A VLAN as reported by the inventory
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Vlan {
    pub id: u64,

    /// Untagged VLANs may report a null name
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,

    #[serde(default)]
    pub vid: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabric: Option<String>,
}

/// A space groups subnets under a label usable by application bindings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Space {
    pub id: u64,

    pub name: String,
}

/// A subnet record
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Subnet {
    pub id: u64,

    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,

    /// CIDR in canonical string form, matched by exact equality
    pub cidr: String,

    pub vlan: Vlan,

    /// Name of the space the subnet belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,
}

/// A deployable machine
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Node {
    pub system_id: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub hostname: String,

    #[serde(default)]
    pub interface_set: Vec<Interface>,
}

/// Interface type as reported by the inventory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    #[default]
    Physical,
    Vlan,
    Bond,
    Bridge,
    #[serde(other)]
    Unknown,
}

/// A machine network interface and its subnet links
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Interface {
    pub id: u64,

    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: InterfaceKind,

    /// Disconnected interfaces carry no VLAN
    #[serde(default)]
    pub vlan: Option<Vlan>,

    #[serde(default)]
    pub links: Vec<Link>,
}

impl Interface {
    /// Whether any link on this interface points at the subnet with `subnet_id`
    pub fn is_linked_to(&self, subnet_id: u64) -> bool {
        self.links
            .iter()
            .any(|l| l.subnet.as_ref().is_some_and(|s| s.id == subnet_id))
    }

    /// Whether any link on this interface points at a subnet named `name`
    pub fn has_link_named(&self, name: &str) -> bool {
        self.links
            .iter()
            .any(|l| l.subnet.as_ref().is_some_and(|s| s.name == name))
    }
}

/// A link between an interface and a subnet
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Link {
    pub id: u64,

    #[serde(default, deserialize_with = "nullable_string")]
    pub mode: String,

    #[serde(default)]
    pub subnet: Option<SubnetRef>,
}

/// The subnet summary embedded in a link
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubnetRef {
    pub id: u64,

    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub cidr: String,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
