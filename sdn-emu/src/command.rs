use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::model::{Network, Port, Router, RouterInterface, Subnet};
use crate::state::SdnState;
use crate::store::Filters;

/// Operations accepted by the emulator.
///
/// Serialized with an `op` tag, e.g.
/// `{"op": "create_subnet", "body": {"subnet": {...}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    // Network operations
    CreateNetwork {
        body: Value,
    },
    UpdateNetwork {
        id: String,
        body: Value,
    },
    DeleteNetwork {
        id: String,
    },
    ShowNetwork {
        id: String,
    },
    ListNetworks {
        #[serde(default)]
        filters: Filters,
    },

    // Subnet operations
    CreateSubnet {
        body: Value,
    },
    UpdateSubnet {
        id: String,
        body: Value,
    },
    DeleteSubnet {
        id: String,
    },
    ShowSubnet {
        id: String,
    },
    ListSubnets {
        #[serde(default)]
        filters: Filters,
    },

    // Port operations
    CreatePort {
        body: Value,
    },
    UpdatePort {
        id: String,
        body: Value,
    },
    DeletePort {
        id: String,
    },
    ShowPort {
        id: String,
    },
    ListPorts {
        #[serde(default)]
        filters: Filters,
    },

    // Router operations
    CreateRouter {
        body: Value,
    },
    UpdateRouter {
        id: String,
        body: Value,
    },
    DeleteRouter {
        id: String,
    },
    ShowRouter {
        id: String,
    },
    ListRouters {
        #[serde(default)]
        filters: Filters,
    },
    AddInterfaceRouter {
        router_id: String,
        body: Value,
    },
    RemoveInterfaceRouter {
        router_id: String,
        body: Value,
    },
}

impl Command {
    /// Operation name as it appears in the `op` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateNetwork { .. } => "create_network",
            Command::UpdateNetwork { .. } => "update_network",
            Command::DeleteNetwork { .. } => "delete_network",
            Command::ShowNetwork { .. } => "show_network",
            Command::ListNetworks { .. } => "list_networks",
            Command::CreateSubnet { .. } => "create_subnet",
            Command::UpdateSubnet { .. } => "update_subnet",
            Command::DeleteSubnet { .. } => "delete_subnet",
            Command::ShowSubnet { .. } => "show_subnet",
            Command::ListSubnets { .. } => "list_subnets",
            Command::CreatePort { .. } => "create_port",
            Command::UpdatePort { .. } => "update_port",
            Command::DeletePort { .. } => "delete_port",
            Command::ShowPort { .. } => "show_port",
            Command::ListPorts { .. } => "list_ports",
            Command::CreateRouter { .. } => "create_router",
            Command::UpdateRouter { .. } => "update_router",
            Command::DeleteRouter { .. } => "delete_router",
            Command::ShowRouter { .. } => "show_router",
            Command::ListRouters { .. } => "list_routers",
            Command::AddInterfaceRouter { .. } => "add_interface_router",
            Command::RemoveInterfaceRouter { .. } => "remove_interface_router",
        }
    }
}

/// Result of applying a command.
///
/// Serializes in the upstream client shape: `{"network": {...}}`,
/// `{"networks": [...]}`, `{"interface": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Network(Network),
    Networks(Vec<Network>),
    Subnet(Subnet),
    Subnets(Vec<Subnet>),
    Port(Port),
    Ports(Vec<Port>),
    Router(Router),
    Routers(Vec<Router>),
    Interface(RouterInterface),
    Updated { id: String },
    Deleted { id: String },
}

impl Response {
    /// Id of the single resource this response describes, if any.
    ///
    /// For interface responses this is the interface port.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Response::Network(n) => Some(&n.id),
            Response::Subnet(s) => Some(&s.id),
            Response::Port(p) => Some(&p.id),
            Response::Router(r) => Some(&r.id),
            Response::Interface(i) => Some(&i.port_id),
            Response::Updated { id } | Response::Deleted { id } => Some(id),
            Response::Networks(_)
            | Response::Subnets(_)
            | Response::Ports(_)
            | Response::Routers(_) => None,
        }
    }
}

impl SdnState {
    /// Apply a command to the emulator.
    pub fn apply(&mut self, cmd: Command) -> Result<Response> {
        let response = match cmd {
            Command::CreateNetwork { body } => Response::Network(self.create_network(&body)?),
            Command::UpdateNetwork { id, body } => {
                self.update_network(&id, &body)?;
                Response::Updated { id }
            }
            Command::DeleteNetwork { id } => {
                self.delete_network(&id)?;
                Response::Deleted { id }
            }
            Command::ShowNetwork { id } => Response::Network(self.show_network(&id)?),
            Command::ListNetworks { filters } => Response::Networks(self.list_networks(&filters)),

            Command::CreateSubnet { body } => Response::Subnet(self.create_subnet(&body)?),
            Command::UpdateSubnet { id, body } => {
                self.update_subnet(&id, &body)?;
                Response::Updated { id }
            }
            Command::DeleteSubnet { id } => {
                self.delete_subnet(&id)?;
                Response::Deleted { id }
            }
            Command::ShowSubnet { id } => Response::Subnet(self.show_subnet(&id)?),
            Command::ListSubnets { filters } => Response::Subnets(self.list_subnets(&filters)),

            Command::CreatePort { body } => Response::Port(self.create_port(&body)?),
            Command::UpdatePort { id, body } => {
                self.update_port(&id, &body)?;
                Response::Updated { id }
            }
            Command::DeletePort { id } => {
                self.delete_port(&id)?;
                Response::Deleted { id }
            }
            Command::ShowPort { id } => Response::Port(self.show_port(&id)?),
            Command::ListPorts { filters } => Response::Ports(self.list_ports(&filters)),

            Command::CreateRouter { body } => Response::Router(self.create_router(&body)?),
            Command::UpdateRouter { id, body } => {
                self.update_router(&id, &body)?;
                Response::Updated { id }
            }
            Command::DeleteRouter { id } => {
                self.delete_router(&id)?;
                Response::Deleted { id }
            }
            Command::ShowRouter { id } => Response::Router(self.show_router(&id)?),
            Command::ListRouters { filters } => Response::Routers(self.list_routers(&filters)),
            Command::AddInterfaceRouter { router_id, body } => {
                Response::Interface(self.add_interface_router(&router_id, &body)?)
            }
            Command::RemoveInterfaceRouter { router_id, body } => {
                Response::Interface(self.remove_interface_router(&router_id, &body)?)
            }
        };
        Ok(response)
    }
}
