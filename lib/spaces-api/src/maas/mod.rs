/// Bindings for the MAAS region API
///
/// Responses are parsed once at the API boundary into the types in
/// [`response`]; every mutating call is described by a typed builder in
/// [`request`] so no caller formats `key=value` strings by hand.

pub mod request;
pub mod response;

pub use request::{
    LinkMode, LinkSubnet, ManagementMode, MaasRequest, NodeGroupInterfaceCreate, SpaceCreate,
    SpaceUpdate, SubnetUpdate, VlanCreate, VlanInterfaceCreate,
};
pub use response::{
    Fabric, Interface, InterfaceKind, Link, Node, NodeGroup, NodeGroupInterface, Space, Subnet,
    SubnetRef, Vlan,
};
