//! Shared test utilities for sdn-emu integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sdn_emu::{
    ControlPlane, EmulatorConfig, EmulatorContext, Filters, Network, Router, Subnet,
};
use serde_json::{Value, json};

pub const TENANT: &str = "tenant-it";

/// Fresh seeded control plane owned by `TENANT`.
pub fn control_plane() -> Arc<ControlPlane> {
    EmulatorContext::new(EmulatorConfig {
        tenant_id: Some(TENANT.to_string()),
        seed: Some(2024),
    })
    .network()
}

pub fn filters(value: Value) -> Filters {
    value.as_object().cloned().unwrap_or_default()
}

pub fn create_network(cp: &ControlPlane) -> Network {
    cp.with_state(|s| s.create_network(&json!({"network": {}})))
        .expect("Failed to create network")
}

pub fn create_subnet(cp: &ControlPlane, network_id: &str, cidr: &str) -> Subnet {
    cp.with_state(|s| {
        s.create_subnet(&json!({"subnet": {
            "network_id": network_id,
            "cidr": cidr,
            "ip_version": 4,
        }}))
    })
    .expect("Failed to create subnet")
}

pub fn create_router(cp: &ControlPlane) -> Router {
    cp.with_state(|s| s.create_router(&json!({"router": {}})))
        .expect("Failed to create router")
}
