//! Shared access to one emulator instance.
//!
//! # Architecture
//!
//! ```text
//! consumer → EmulatorContext::network() → Arc<ControlPlane>
//!                                             ↓
//!                                   Mutex<SdnState>   // one lock per operation
//! ```
//!
//! Guards in [`SdnState`] are check-then-act, so the whole operation runs
//! under a single lock spanning all four stores.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::command::{Command, Response};
use crate::config::EmulatorConfig;
use crate::error::Result;
use crate::state::SdnState;

/// Thread-safe handle to an [`SdnState`].
#[derive(Debug)]
pub struct ControlPlane {
    state: Mutex<SdnState>,
}

impl ControlPlane {
    pub fn new(state: SdnState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn from_config(config: &EmulatorConfig) -> Self {
        Self::new(SdnState::from_config(config))
    }

    fn lock(&self) -> MutexGuard<'_, SdnState> {
        // Stores are written only after every guard has passed, so a panic
        // while the lock was held cannot have left a half-applied operation.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one command atomically.
    pub fn execute(&self, cmd: Command) -> Result<Response> {
        let op = cmd.name();
        let result = self.lock().apply(cmd);
        match &result {
            Ok(response) => debug!(op, id = response.resource_id(), "command applied"),
            Err(e) => warn!(op, kind = e.kind(), error = %e, "command rejected"),
        }
        result
    }

    /// Run `f` with exclusive access to the state.
    ///
    /// Use this for typed calls; everything inside `f` is one atomic step.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SdnState) -> R) -> R {
        f(&mut *self.lock())
    }

    pub fn tenant_id(&self) -> String {
        self.lock().tenant_id().to_string()
    }
}

/// Services built once per session and handed to consumers.
#[derive(Debug, Clone)]
pub struct EmulatorContext {
    config: EmulatorConfig,
    network: Arc<ControlPlane>,
}

impl EmulatorContext {
    pub fn new(config: EmulatorConfig) -> Self {
        let network = Arc::new(ControlPlane::from_config(&config));
        debug!(
            tenant_id = %network.tenant_id(),
            seeded = config.seed.is_some(),
            "emulator context created"
        );
        Self { config, network }
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// The networking control plane.
    pub fn network(&self) -> Arc<ControlPlane> {
        Arc::clone(&self.network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdnError;
    use serde_json::json;

    fn context() -> EmulatorContext {
        EmulatorContext::new(EmulatorConfig {
            tenant_id: Some("tenant-ctx".to_string()),
            seed: Some(5),
        })
    }

    #[test]
    fn test_context_shares_one_control_plane() {
        let ctx = context();
        let a = ctx.network();
        let b = ctx.clone().network();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.tenant_id(), "tenant-ctx");

        a.with_state(|s| s.create_network(&json!({"network": {}})))
            .unwrap();
        assert_eq!(
            b.with_state(|s| s.list_networks(&Default::default()).len()),
            1
        );
    }

    #[test]
    fn test_execute() {
        let cp = context().network();
        let response = cp
            .execute(Command::CreateRouter {
                body: json!({"router": {"name": "r1"}}),
            })
            .unwrap();
        let id = response.resource_id().unwrap().to_string();

        let result = cp.execute(Command::DeleteNetwork { id: id.clone() });
        assert!(matches!(result, Err(SdnError::ResourceNotFound { kind: "network", .. })));

        cp.execute(Command::DeleteRouter { id }).unwrap();
    }
}
