//! Segment address planning
//!
//! A segment is a VLAN-tagged address block. Every address a segment needs
//! is derived from its network address at fixed offsets:
//!
//! | Purpose        | Offset     |
//! |----------------|------------|
//! | gateway        | +1         |
//! | dynamic range  | +10 .. +99 |
//! | static range   | +100 ..+200|

use crate::{Result, SpacesError};
use ipnetwork::Ipv4Network;
use spaces_api::maas::{ManagementMode, NodeGroupInterfaceCreate};
use std::net::Ipv4Addr;

const GATEWAY_OFFSET: u32 = 1;
const DYNAMIC_START_OFFSET: u32 = 10;
const DYNAMIC_END_OFFSET: u32 = 99;
const STATIC_START_OFFSET: u32 = 100;
const STATIC_END_OFFSET: u32 = 200;
const MAX_PREFIX: u8 = 24;

/// A named, VLAN-tagged address block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    name: String,
    network: Ipv4Network,
    vid: u16,
    interface: String,
}

impl Segment {
    /// Plan a segment, rejecting any CIDR that cannot hold the derived ranges
    pub fn plan(name: &str, cidr: &str, vid: u16, interface: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(SpacesError::InvalidTopologyConfig(
                "segment name must not be empty".to_string(),
            ));
        }

        let network: Ipv4Network = cidr.parse().map_err(|e| {
            SpacesError::InvalidTopologyConfig(format!("segment {}: bad CIDR {:?}: {}", name, cidr, e))
        })?;

        if network.ip() != network.network() {
            return Err(SpacesError::InvalidTopologyConfig(format!(
                "segment {}: {} has host bits set",
                name, cidr
            )));
        }

        // A /24 is the smallest block whose broadcast address lies past +200.
        if network.prefix() > MAX_PREFIX {
            return Err(SpacesError::InvalidTopologyConfig(format!(
                "segment {}: {} is too small, need room for offset +{}",
                name, cidr, STATIC_END_OFFSET
            )));
        }

        if !(1..=4094).contains(&vid) {
            return Err(SpacesError::InvalidTopologyConfig(format!(
                "segment {}: VLAN id {} out of range 1-4094",
                name, vid
            )));
        }

        if interface.is_empty() {
            return Err(SpacesError::InvalidTopologyConfig(format!(
                "segment {}: physical interface must not be empty",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
            network,
            vid,
            interface: interface.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network(&self) -> Ipv4Network {
        self.network
    }

    /// Canonical CIDR string, as the inventory reports it
    pub fn cidr(&self) -> String {
        self.network.to_string()
    }

    /// 802.1Q tag
    pub fn vid(&self) -> u16 {
        self.vid
    }

    /// Physical (tagged) interface on the cluster controller
    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn network_address(&self) -> Ipv4Addr {
        self.network.network()
    }

    pub fn netmask(&self) -> Ipv4Addr {
        self.network.mask()
    }

    pub fn gateway(&self) -> Ipv4Addr {
        self.offset(GATEWAY_OFFSET)
    }

    pub fn dynamic_range(&self) -> (Ipv4Addr, Ipv4Addr) {
        (self.offset(DYNAMIC_START_OFFSET), self.offset(DYNAMIC_END_OFFSET))
    }

    pub fn static_range(&self) -> (Ipv4Addr, Ipv4Addr) {
        (self.offset(STATIC_START_OFFSET), self.offset(STATIC_END_OFFSET))
    }

    /// Whether `addr` is a usable host address of this segment
    pub fn contains_host(&self, addr: Ipv4Addr) -> bool {
        self.network.contains(addr)
            && addr != self.network.network()
            && addr != self.network.broadcast()
    }

    fn offset(&self, n: u32) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network.network()) + n)
    }
}

impl From<&Segment> for NodeGroupInterfaceCreate {
    fn from(segment: &Segment) -> Self {
        let (ip_range_low, ip_range_high) = segment.dynamic_range();
        let (static_ip_range_low, static_ip_range_high) = segment.static_range();
        Self {
            name: segment.interface.clone(),
            interface: segment.interface.clone(),
            ip: segment.gateway(),
            management: ManagementMode::DhcpAndDns,
            router_ip: segment.gateway(),
            subnet_mask: segment.netmask(),
            ip_range_low,
            ip_range_high,
            static_ip_range_low,
            static_ip_range_high,
        }
    }
}
