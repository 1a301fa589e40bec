pub mod command;
pub mod config;
pub mod control_plane;
pub mod error;
pub mod idgen;
pub mod model;
pub mod payload;
pub mod scenario;
pub mod state;
pub mod store;

pub use command::{Command, Response};
pub use config::EmulatorConfig;
pub use control_plane::{ControlPlane, EmulatorContext};
pub use error::{Result, SdnError};
pub use model::{FixedIp, Network, Port, Router, RouterInterface, Subnet};
pub use state::SdnState;
pub use store::Filters;
