//! Resource types held by the emulator.
//!
//! Field names serialize the way the upstream networking API spells them
//! (`router:external`, `binding:host_id`, ...), so filters and update
//! payloads use the same keys a real client would send.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Resource;

/// Status every resource is created with.
pub const STATUS_ACTIVE: &str = "ACTIVE";

/// Network data stored in the emulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub status: String,
    pub tenant_id: String,
    /// Ids of subnets created on this network. Display only.
    pub subnets: Vec<String>,
    pub admin_state_up: bool,
    pub shared: bool,
    #[serde(rename = "router:external")]
    pub router_external: bool,
    #[serde(rename = "provider:physical_network")]
    pub provider_physical_network: Value,
    #[serde(rename = "provider:network_type")]
    pub provider_network_type: Value,
    #[serde(rename = "provider:segmentation_id")]
    pub provider_segmentation_id: Value,
}

/// Subnet data stored in the emulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub tenant_id: String,
    pub cidr: String,
    pub ip_version: u8,
    pub gateway_ip: String,
    pub enable_dhcp: bool,
    pub allocation_pools: Vec<Value>,
    pub dns_nameservers: Vec<Value>,
    pub host_routes: Vec<Value>,
    pub ipv6_ra_mode: Option<String>,
    pub ipv6_address_mode: Option<String>,
}

/// One address allocation on a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedIp {
    pub subnet_id: String,
    pub ip_address: String,
}

/// Port data stored in the emulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub name: String,
    pub status: String,
    pub tenant_id: String,
    pub network_id: String,
    pub admin_state_up: bool,
    pub mac_address: String,
    /// Owning device (a router id for interface ports), empty if unbound.
    pub device_id: String,
    /// Empty if unowned. A non-empty owner blocks deletion.
    pub device_owner: String,
    pub fixed_ips: Vec<FixedIp>,
    pub security_groups: Vec<String>,
    pub allowed_address_pairs: Vec<Value>,
    pub extra_dhcp_opts: Vec<Value>,
    #[serde(rename = "binding:host_id")]
    pub binding_host_id: String,
    #[serde(rename = "binding:vnic_type")]
    pub binding_vnic_type: String,
    #[serde(rename = "binding:vif_type")]
    pub binding_vif_type: String,
    #[serde(rename = "binding:vif_details")]
    pub binding_vif_details: Value,
    #[serde(rename = "binding:profile")]
    pub binding_profile: Value,
}

impl Port {
    /// True if any fixed IP of this port is allocated from `subnet_id`.
    pub fn uses_subnet(&self, subnet_id: &str) -> bool {
        self.fixed_ips.iter().any(|ip| ip.subnet_id == subnet_id)
    }
}

/// Router data stored in the emulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Router {
    pub id: String,
    pub name: String,
    pub status: String,
    pub tenant_id: String,
    pub external_gateway_info: Option<Value>,
    pub admin_state_up: bool,
}

/// Result of attaching or detaching a router interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterInterface {
    pub subnet_id: String,
    pub tenant_id: String,
    pub port_id: String,
    #[serde(rename = "id")]
    pub router_id: String,
}

impl Resource for Network {
    const KIND: &'static str = "network";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for Subnet {
    const KIND: &'static str = "subnet";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for Port {
    const KIND: &'static str = "port";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for Router {
    const KIND: &'static str = "router";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// Create request DTOs (validated payloads)
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct CreateNetworkRequest {
    pub name: String,
    pub admin_state_up: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateSubnetRequest {
    pub name: String,
    pub network_id: String,
    pub cidr: String,
    /// Accepted but not honoured; subnets are always IPv4.
    #[allow(dead_code)]
    pub ip_version: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatePortRequest {
    pub name: String,
    pub network_id: String,
    pub admin_state_up: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateRouterRequest {
    pub name: String,
    pub admin_state_up: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InterfaceRequest {
    pub subnet_id: String,
}
