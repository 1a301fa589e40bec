//! Control-plane emulator state.
//!
//! [`SdnState`] owns the four resource stores and is the only place that
//! enforces invariants between them. Every operation validates its payload
//! and checks its guards before the first store write, so a failed call
//! leaves the state exactly as it was.

use serde_json::{Value, json};

use crate::config::EmulatorConfig;
use crate::error::{Result, SdnError};
use crate::idgen::{IdGenerator, NAME_LENGTH};
use crate::model::{
    CreateNetworkRequest, CreatePortRequest, CreateRouterRequest, CreateSubnetRequest, FixedIp,
    InterfaceRequest, Network, Port, Router, RouterInterface, STATUS_ACTIVE, Subnet,
};
use crate::payload::{Payload, decode, expect_object, merge, unwrap_envelope, validate};
use crate::store::{Filters, Resource, ResourceStore};

/// In-memory networking control plane.
#[derive(Debug)]
pub struct SdnState {
    tenant_id: String,
    ids: IdGenerator,
    networks: ResourceStore<Network>,
    subnets: ResourceStore<Subnet>,
    ports: ResourceStore<Port>,
    routers: ResourceStore<Router>,
}

impl SdnState {
    /// Empty emulator owned by `tenant_id`, with an entropy-seeded generator.
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self::with_generator(tenant_id, IdGenerator::new())
    }

    pub fn with_generator(tenant_id: impl Into<String>, ids: IdGenerator) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ids,
            networks: ResourceStore::new(),
            subnets: ResourceStore::new(),
            ports: ResourceStore::new(),
            routers: ResourceStore::new(),
        }
    }

    pub fn from_config(config: &EmulatorConfig) -> Self {
        let (tenant_id, ids) = config.identity();
        Self::with_generator(tenant_id, ids)
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn create_defaults(&mut self, prefix: &str, admin_state_up: bool) -> Payload {
        let mut defaults = Payload::new();
        defaults.insert(
            "name".to_string(),
            Value::String(self.ids.generate_name(prefix, NAME_LENGTH)),
        );
        if admin_state_up {
            defaults.insert("admin_state_up".to_string(), Value::Bool(true));
        }
        defaults
    }

    // =========================================================================
    // Networks
    // =========================================================================

    pub fn create_network(&mut self, body: &Value) -> Result<Network> {
        let payload = unwrap_envelope(body, Network::KIND)?;
        let defaults = self.create_defaults("net_", true);
        let request: CreateNetworkRequest = decode(validate(&payload, &[], defaults)?)?;

        let network = Network {
            id: self.ids.generate_id(),
            name: request.name,
            status: STATUS_ACTIVE.to_string(),
            tenant_id: self.tenant_id.clone(),
            subnets: Vec::new(),
            admin_state_up: request.admin_state_up,
            shared: false,
            router_external: true,
            provider_physical_network: Value::Null,
            provider_network_type: json!("local"),
            provider_segmentation_id: Value::Null,
        };
        self.networks.insert(network.clone());
        Ok(network)
    }

    /// Overwrite named fields of a network. Keys must name existing fields and
    /// keep their JSON type.
    pub fn update_network(&mut self, id: &str, body: &Value) -> Result<()> {
        update(&mut self.networks, id, body, || {
            SdnError::not_found(Network::KIND, id)
        })
    }

    /// Delete a network that no port is attached to.
    ///
    /// Subnets on the network are not consulted and are left pointing at the
    /// removed id.
    pub fn delete_network(&mut self, id: &str) -> Result<()> {
        if !self.networks.contains(id) {
            return Err(SdnError::not_found(Network::KIND, id));
        }
        let attached = self.ports.iter().filter(|p| p.network_id == id).count();
        if attached > 0 {
            return Err(SdnError::in_use(
                Network::KIND,
                id,
                format!("{} port(s) attached", attached),
            ));
        }
        self.networks.remove(id);
        Ok(())
    }

    pub fn list_networks(&self, filters: &Filters) -> Vec<Network> {
        self.networks.list(filters)
    }

    pub fn get_network(&self, id: &str) -> Option<&Network> {
        self.networks.get(id)
    }

    pub fn show_network(&self, id: &str) -> Result<Network> {
        self.networks
            .get(id)
            .cloned()
            .ok_or_else(|| SdnError::not_found(Network::KIND, id))
    }

    pub fn find_network_by_name(&self, name: &str) -> Option<&Network> {
        self.networks.find_by_name(name)
    }

    // =========================================================================
    // Subnets
    // =========================================================================

    pub fn create_subnet(&mut self, body: &Value) -> Result<Subnet> {
        let payload = unwrap_envelope(body, Subnet::KIND)?;
        let defaults = self.create_defaults("subnet_", false);
        let request: CreateSubnetRequest = decode(validate(
            &payload,
            &["network_id", "cidr", "ip_version"],
            defaults,
        )?)?;

        if !self.networks.contains(&request.network_id) {
            return Err(SdnError::not_found(Network::KIND, request.network_id));
        }

        let subnet = Subnet {
            id: self.ids.generate_id(),
            name: request.name,
            network_id: request.network_id,
            tenant_id: self.tenant_id.clone(),
            gateway_ip: derive_gateway_ip(&request.cidr),
            cidr: request.cidr,
            // requested version is ignored
            ip_version: 4,
            enable_dhcp: true,
            allocation_pools: Vec::new(),
            dns_nameservers: Vec::new(),
            host_routes: Vec::new(),
            ipv6_ra_mode: None,
            ipv6_address_mode: None,
        };

        if let Some(network) = self.networks.get_mut(&subnet.network_id) {
            network.subnets.push(subnet.id.clone());
        }
        self.subnets.insert(subnet.clone());
        Ok(subnet)
    }

    /// Overwrite named fields of a subnet.
    ///
    /// Keys must name existing fields and keep their JSON type. Moving the
    /// subnet to another network moves its id between the networks'
    /// `subnets` lists.
    pub fn update_subnet(&mut self, id: &str, body: &Value) -> Result<()> {
        let previous = self.subnets.get(id).map(|s| s.network_id.clone());
        update(&mut self.subnets, id, body, || SdnError::not_found(Subnet::KIND, id))?;

        let current = self.subnets.get(id).map(|s| s.network_id.clone());
        match (previous, current) {
            (Some(previous), Some(current)) if previous != current => {
                if let Some(network) = self.networks.get_mut(&previous) {
                    network.subnets.retain(|s| s != id);
                }
                if let Some(network) = self.networks.get_mut(&current) {
                    network.subnets.push(id.to_string());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Delete a subnet no port holds an address from.
    ///
    /// Whether the subnet's network still exists is not checked.
    pub fn delete_subnet(&mut self, id: &str) -> Result<()> {
        if !self.subnets.contains(id) {
            return Err(SdnError::not_found(Subnet::KIND, id));
        }
        let allocated = self.ports.iter().filter(|p| p.uses_subnet(id)).count();
        if allocated > 0 {
            return Err(SdnError::in_use(
                Subnet::KIND,
                id,
                format!("{} port(s) hold addresses", allocated),
            ));
        }

        if let Some(subnet) = self.subnets.remove(id) {
            if let Some(network) = self.networks.get_mut(&subnet.network_id) {
                network.subnets.retain(|s| s != id);
            }
        }
        Ok(())
    }

    pub fn list_subnets(&self, filters: &Filters) -> Vec<Subnet> {
        self.subnets.list(filters)
    }

    pub fn get_subnet(&self, id: &str) -> Option<&Subnet> {
        self.subnets.get(id)
    }

    pub fn show_subnet(&self, id: &str) -> Result<Subnet> {
        self.subnets
            .get(id)
            .cloned()
            .ok_or_else(|| SdnError::not_found(Subnet::KIND, id))
    }

    pub fn find_subnet_by_name(&self, name: &str) -> Option<&Subnet> {
        self.subnets.find_by_name(name)
    }

    // =========================================================================
    // Ports
    // =========================================================================

    pub fn create_port(&mut self, body: &Value) -> Result<Port> {
        let payload = unwrap_envelope(body, Port::KIND)?;
        let port = self.build_port(&payload)?;
        self.ports.insert(port.clone());
        Ok(port)
    }

    /// Validate a port payload and assemble the port without storing it.
    fn build_port(&mut self, payload: &Payload) -> Result<Port> {
        let defaults = self.create_defaults("port_", true);
        let request: CreatePortRequest = decode(validate(payload, &["network_id"], defaults)?)?;

        if !self.networks.contains(&request.network_id) {
            return Err(SdnError::not_found(Network::KIND, request.network_id));
        }

        Ok(Port {
            id: self.ids.generate_id(),
            name: request.name,
            status: STATUS_ACTIVE.to_string(),
            tenant_id: self.tenant_id.clone(),
            network_id: request.network_id,
            admin_state_up: request.admin_state_up,
            mac_address: self.ids.generate_mac(),
            device_id: String::new(),
            device_owner: String::new(),
            fixed_ips: Vec::new(),
            security_groups: Vec::new(),
            allowed_address_pairs: Vec::new(),
            extra_dhcp_opts: Vec::new(),
            binding_host_id: "fakehost".to_string(),
            binding_vnic_type: "normal".to_string(),
            binding_vif_type: "ovs".to_string(),
            binding_vif_details: json!({"port_filter": true}),
            binding_profile: json!({}),
        })
    }

    /// Overwrite named fields of a port. Keys must name existing fields and
    /// keep their JSON type.
    pub fn update_port(&mut self, id: &str, body: &Value) -> Result<()> {
        update(&mut self.ports, id, body, || SdnError::PortNotFound(id.to_string()))
    }

    /// Delete a port that has no device owner.
    pub fn delete_port(&mut self, id: &str) -> Result<()> {
        let port = self
            .ports
            .get(id)
            .ok_or_else(|| SdnError::PortNotFound(id.to_string()))?;
        if !port.device_owner.is_empty() {
            return Err(SdnError::in_use(
                Port::KIND,
                id,
                format!("owned by '{}'", port.device_owner),
            ));
        }
        self.ports.remove(id);
        Ok(())
    }

    pub fn list_ports(&self, filters: &Filters) -> Vec<Port> {
        self.ports.list(filters)
    }

    pub fn get_port(&self, id: &str) -> Option<&Port> {
        self.ports.get(id)
    }

    pub fn show_port(&self, id: &str) -> Result<Port> {
        self.ports
            .get(id)
            .cloned()
            .ok_or_else(|| SdnError::PortNotFound(id.to_string()))
    }

    pub fn find_port_by_name(&self, name: &str) -> Option<&Port> {
        self.ports.find_by_name(name)
    }

    // =========================================================================
    // Routers
    // =========================================================================

    pub fn create_router(&mut self, body: &Value) -> Result<Router> {
        let payload = unwrap_envelope(body, Router::KIND)?;
        let defaults = self.create_defaults("router_", true);
        let request: CreateRouterRequest = decode(validate(&payload, &[], defaults)?)?;

        let router = Router {
            id: self.ids.generate_id(),
            name: request.name,
            status: STATUS_ACTIVE.to_string(),
            tenant_id: self.tenant_id.clone(),
            external_gateway_info: None,
            admin_state_up: request.admin_state_up,
        };
        self.routers.insert(router.clone());
        Ok(router)
    }

    /// Overwrite named fields of a router. Keys must name existing fields and
    /// keep their JSON type.
    pub fn update_router(&mut self, id: &str, body: &Value) -> Result<()> {
        update(&mut self.routers, id, body, || SdnError::not_found(Router::KIND, id))
    }

    /// Delete a router with no interface ports.
    pub fn delete_router(&mut self, id: &str) -> Result<()> {
        if !self.routers.contains(id) {
            return Err(SdnError::not_found(Router::KIND, id));
        }
        let interfaces = self.ports.iter().filter(|p| p.device_id == id).count();
        if interfaces > 0 {
            return Err(SdnError::in_use(
                Router::KIND,
                id,
                format!("{} interface port(s) attached", interfaces),
            ));
        }
        self.routers.remove(id);
        Ok(())
    }

    pub fn list_routers(&self, filters: &Filters) -> Vec<Router> {
        self.routers.list(filters)
    }

    pub fn get_router(&self, id: &str) -> Option<&Router> {
        self.routers.get(id)
    }

    pub fn show_router(&self, id: &str) -> Result<Router> {
        self.routers
            .get(id)
            .cloned()
            .ok_or_else(|| SdnError::not_found(Router::KIND, id))
    }

    pub fn find_router_by_name(&self, name: &str) -> Option<&Router> {
        self.routers.find_by_name(name)
    }

    // =========================================================================
    // Router interfaces
    // =========================================================================

    /// Attach `router_id` to the subnet named in `body` (`{"subnet_id": ..}`).
    ///
    /// Creates a port on the subnet's network, bound to the router, holding
    /// the subnet's gateway address.
    pub fn add_interface_router(
        &mut self,
        router_id: &str,
        body: &Value,
    ) -> Result<RouterInterface> {
        let request: InterfaceRequest =
            decode(validate(expect_object(body)?, &["subnet_id"], Payload::new())?)?;

        if !self.routers.contains(router_id) {
            return Err(SdnError::not_found(Router::KIND, router_id));
        }
        let subnet = self
            .subnets
            .get(&request.subnet_id)
            .cloned()
            .ok_or_else(|| SdnError::not_found(Subnet::KIND, &request.subnet_id))?;

        let mut port_payload = Payload::new();
        port_payload.insert("network_id".to_string(), Value::String(subnet.network_id));
        let mut port = self.build_port(&port_payload)?;
        port.device_id = router_id.to_string();
        port.fixed_ips.push(FixedIp {
            subnet_id: subnet.id.clone(),
            ip_address: subnet.gateway_ip,
        });

        let interface = RouterInterface {
            subnet_id: subnet.id,
            tenant_id: port.tenant_id.clone(),
            port_id: port.id.clone(),
            router_id: router_id.to_string(),
        };
        self.ports.insert(port);
        Ok(interface)
    }

    /// Detach `router_id` from the subnet named in `body`.
    ///
    /// Removes the oldest interface port of the router on that subnet. Fails
    /// with `ResourceNotFound` when there is none.
    pub fn remove_interface_router(
        &mut self,
        router_id: &str,
        body: &Value,
    ) -> Result<RouterInterface> {
        let request: InterfaceRequest =
            decode(validate(expect_object(body)?, &["subnet_id"], Payload::new())?)?;

        if !self.routers.contains(router_id) {
            return Err(SdnError::not_found(Router::KIND, router_id));
        }
        let subnet = self
            .subnets
            .get(&request.subnet_id)
            .ok_or_else(|| SdnError::not_found(Subnet::KIND, &request.subnet_id))?;
        let tenant_id = subnet.tenant_id.clone();

        let port_id = self
            .ports
            .iter()
            .find(|p| p.device_id == router_id && p.uses_subnet(&request.subnet_id))
            .map(|p| p.id.clone())
            .ok_or_else(|| {
                SdnError::not_found(
                    "router interface",
                    format!("{}:{}", router_id, request.subnet_id),
                )
            })?;

        self.ports.remove(&port_id);
        Ok(RouterInterface {
            subnet_id: request.subnet_id,
            tenant_id,
            port_id,
            router_id: router_id.to_string(),
        })
    }
}

fn update<T: Resource>(
    store: &mut ResourceStore<T>,
    id: &str,
    body: &Value,
    not_found: impl FnOnce() -> SdnError,
) -> Result<()> {
    let current = store.get(id).ok_or_else(not_found)?;
    let patch = unwrap_envelope(body, T::KIND)?;
    let updated = merge(current, &patch)?;
    store.insert(updated);
    Ok(())
}

/// Gateway address for a subnet: the cidr with the character before the
/// first `/` and everything after it replaced by `1`.
///
/// Only right for conventional `x.y.z.0/nn` IPv4 ranges; this is not CIDR
/// arithmetic. A cidr without a `/` is returned unchanged.
pub fn derive_gateway_ip(cidr: &str) -> String {
    match cidr.char_indices().find(|&(i, c)| c == '/' && i > 0) {
        Some((slash, _)) => {
            let mut head = cidr[..slash].chars();
            head.next_back();
            format!("{}1", head.as_str())
        }
        None => cidr.to_string(),
    }
}
