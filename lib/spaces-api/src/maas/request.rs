use std::fmt;
use std::net::Ipv4Addr;

/// A mutating inventory request rendered as `key=value` parameters
pub trait MaasRequest {
    /// Parameters in the order they are sent
    fn params(&self) -> Vec<(&'static str, String)>;

    /// Render the parameters as command-line operands
    fn to_operands(&self) -> Vec<String> {
        self.params()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect()
    }
}

/// Which services a cluster controller runs on an interface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagementMode {
    Unmanaged = 0,
    Dhcp = 1,
    DhcpAndDns = 2,
}

/// `node-group-interfaces new`: a managed interface on the cluster controller
#[derive(Clone, Debug, PartialEq)]
pub struct NodeGroupInterfaceCreate {
    pub name: String,
    pub interface: String,
    pub ip: Ipv4Addr,
    pub management: ManagementMode,
    pub router_ip: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub ip_range_low: Ipv4Addr,
    pub ip_range_high: Ipv4Addr,
    pub static_ip_range_low: Ipv4Addr,
    pub static_ip_range_high: Ipv4Addr,
}

impl MaasRequest for NodeGroupInterfaceCreate {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("interface", self.interface.clone()),
            ("ip", self.ip.to_string()),
            ("management", (self.management as u8).to_string()),
            ("router_ip", self.router_ip.to_string()),
            ("subnet_mask", self.subnet_mask.to_string()),
            ("ip_range_low", self.ip_range_low.to_string()),
            ("ip_range_high", self.ip_range_high.to_string()),
            ("static_ip_range_low", self.static_ip_range_low.to_string()),
            ("static_ip_range_high", self.static_ip_range_high.to_string()),
        ]
    }
}

/// `vlans create <fabric>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VlanCreate {
    pub name: String,
    pub vid: u16,
}

impl MaasRequest for VlanCreate {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone()), ("vid", self.vid.to_string())]
    }
}

/// `spaces create`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpaceCreate {
    pub name: String,
}

impl MaasRequest for SpaceCreate {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }
}

/// `space update <id>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpaceUpdate {
    pub name: String,
}

impl MaasRequest for SpaceUpdate {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }
}

/// `subnet update <id>`: binds a subnet to a VLAN and space in one call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubnetUpdate {
    pub vlan: u64,
    pub space: u64,
    pub name: String,
}

impl MaasRequest for SubnetUpdate {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("vlan", self.vlan.to_string()),
            ("space", self.space.to_string()),
            ("name", self.name.clone()),
        ]
    }
}

/// `interfaces create-vlan <system_id>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VlanInterfaceCreate {
    /// Inventory id of the parent interface
    pub parent: u64,
    /// Inventory id of the VLAN (not the 802.1Q tag)
    pub vlan: u64,
}

impl MaasRequest for VlanInterfaceCreate {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("parent", self.parent.to_string()),
            ("vlan", self.vlan.to_string()),
        ]
    }
}

/// Addressing mode for a subnet link
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkMode {
    Auto,
    Dhcp,
    LinkUp,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkMode::Auto => write!(f, "auto"),
            LinkMode::Dhcp => write!(f, "dhcp"),
            LinkMode::LinkUp => write!(f, "link_up"),
        }
    }
}

/// `interface link-subnet <system_id> <interface_id>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkSubnet {
    pub mode: LinkMode,
    pub subnet: u64,
}

impl LinkSubnet {
    /// Link in automatic-addressing mode
    pub fn auto(subnet: u64) -> Self {
        Self {
            mode: LinkMode::Auto,
            subnet,
        }
    }
}

impl MaasRequest for LinkSubnet {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mode", self.mode.to_string()),
            ("subnet", self.subnet.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_group_interface_operands() {
        let req = NodeGroupInterfaceCreate {
            name: "enp2s0.10".to_string(),
            interface: "enp2s0.10".to_string(),
            ip: Ipv4Addr::new(192, 168, 10, 1),
            management: ManagementMode::DhcpAndDns,
            router_ip: Ipv4Addr::new(192, 168, 10, 1),
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            ip_range_low: Ipv4Addr::new(192, 168, 10, 10),
            ip_range_high: Ipv4Addr::new(192, 168, 10, 99),
            static_ip_range_low: Ipv4Addr::new(192, 168, 10, 100),
            static_ip_range_high: Ipv4Addr::new(192, 168, 10, 200),
        };

        let operands = req.to_operands();
        assert_eq!(operands[0], "name=enp2s0.10");
        assert_eq!(operands[3], "management=2");
        assert_eq!(operands[5], "subnet_mask=255.255.255.0");
        assert_eq!(operands[9], "static_ip_range_high=192.168.10.200");
    }

    #[test]
    fn test_link_subnet_operands() {
        assert_eq!(
            LinkSubnet::auto(42).to_operands(),
            vec!["mode=auto".to_string(), "subnet=42".to_string()]
        );
        assert_eq!(LinkMode::LinkUp.to_string(), "link_up");
    }

    #[test]
    fn test_subnet_update_operands() {
        let req = SubnetUpdate {
            vlan: 5002,
            space: 3,
            name: "internal".to_string(),
        };
        assert_eq!(
            req.to_operands(),
            vec!["vlan=5002", "space=3", "name=internal"]
        );
    }
}
