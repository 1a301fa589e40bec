//! Emulator configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::idgen::IdGenerator;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for one emulator instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmulatorConfig {
    /// Tenant every created resource belongs to. Generated when unset.
    pub tenant_id: Option<String>,
    /// Seed for ids, names and MAC addresses. Entropy when unset.
    pub seed: Option<u64>,
}

impl EmulatorConfig {
    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn id_generator(&self) -> IdGenerator {
        match self.seed {
            Some(seed) => IdGenerator::seeded(seed),
            None => IdGenerator::new(),
        }
    }

    /// Tenant id and generator for a new emulator.
    ///
    /// An unset tenant is drawn from the generator, so a seeded config
    /// yields the same tenant on every run.
    pub fn identity(&self) -> (String, IdGenerator) {
        let mut ids = self.id_generator();
        let tenant_id = match &self.tenant_id {
            Some(tenant_id) => tenant_id.clone(),
            None => ids.generate_tenant_id(),
        };
        (tenant_id, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tenant_id": "tenant-a", "seed": 42}}"#).unwrap();

        let config = EmulatorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.tenant_id.as_deref(), Some("tenant-a"));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.identity().0, "tenant-a");
    }

    #[test]
    fn test_missing_fields_default() {
        let config: EmulatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EmulatorConfig::default());
        // unseeded tenant ids differ between calls
        assert_ne!(config.identity().0, config.identity().0);
    }

    #[test]
    fn test_seeded_tenant_is_stable() {
        let config = EmulatorConfig {
            tenant_id: None,
            seed: Some(7),
        };
        let (tenant_a, mut ids_a) = config.identity();
        let (tenant_b, mut ids_b) = config.identity();
        assert_eq!(tenant_a, tenant_b);
        assert_eq!(ids_a.generate_id(), ids_b.generate_id());
        assert_ne!(ids_a.generate_id(), tenant_a);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<EmulatorConfig, _> = serde_json::from_str(r#"{"tenant": "x"}"#);
        assert!(result.is_err());
    }
}
