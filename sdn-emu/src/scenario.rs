//! Scripted command sequences.
//!
//! A scenario is a JSON document listing commands to run against one
//! emulator, in order:
//!
//! ```json
//! {"steps": [
//!   {"op": "create_network", "body": {"network": {}}, "bind": "net"},
//!   {"op": "create_port", "body": {"port": {"network_id": "$net"}}},
//!   {"op": "delete_network", "id": "$net", "expect_error": "ResourceInUse"}
//! ]}
//! ```
//!
//! `bind` records the id of the resource a step returned; `$name` strings in
//! later steps are replaced by it. `expect_error` names the error kind the
//! step must fail with.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::info;

use crate::command::{Command, Response};
use crate::control_plane::ControlPlane;
use crate::error::SdnError;

/// Scenario loading and execution errors.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("step {index}: invalid command: {source}")]
    InvalidStep {
        index: usize,
        source: serde_json::Error,
    },

    #[error("step {index}: unknown binding '${name}'")]
    UnknownBinding { index: usize, name: String },

    #[error("step {index} ({op}): cannot bind '{name}', response carries no id")]
    NothingToBind {
        index: usize,
        op: &'static str,
        name: String,
    },

    #[error("step {index} ({op}): failed: {error}")]
    Failed {
        index: usize,
        op: &'static str,
        error: SdnError,
    },

    #[error("step {index} ({op}): expected {expected}, but it succeeded")]
    ExpectedFailure {
        index: usize,
        op: &'static str,
        expected: String,
    },

    #[error("step {index} ({op}): expected {expected}, got {}: {error}", .error.kind())]
    WrongFailure {
        index: usize,
        op: &'static str,
        expected: String,
        error: SdnError,
    },
}

/// A parsed scenario file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

/// One scripted command.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub expect_error: Option<String>,
    /// The command itself, before binding substitution.
    #[serde(flatten)]
    pub command: Map<String, Value>,
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// What a step produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    pub result: Result<Response, SdnError>,
}

impl StepOutcome {
    /// JSON report line for this step.
    pub fn to_json(&self) -> Value {
        match &self.result {
            Ok(response) => json!({
                "step": self.index,
                "op": self.op,
                "response": response,
            }),
            Err(e) => json!({
                "step": self.index,
                "op": self.op,
                "error": {"kind": e.kind(), "message": e.to_string()},
            }),
        }
    }
}

/// Runs scenario steps against a control plane, tracking bindings.
pub struct ScenarioRunner<'a> {
    control_plane: &'a ControlPlane,
    bindings: HashMap<String, String>,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(control_plane: &'a ControlPlane) -> Self {
        Self {
            control_plane,
            bindings: HashMap::new(),
        }
    }

    /// Id recorded under `name` by an earlier step.
    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    /// Run every step, stopping at the first unexpected outcome.
    pub fn run(&mut self, scenario: &Scenario) -> Result<Vec<StepOutcome>, ScenarioError> {
        scenario
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.run_step(index, step))
            .collect()
    }

    pub fn run_step(&mut self, index: usize, step: &Step) -> Result<StepOutcome, ScenarioError> {
        let resolved = self.substitute(index, &Value::Object(step.command.clone()))?;
        let cmd: Command = serde_json::from_value(resolved)
            .map_err(|source| ScenarioError::InvalidStep { index, source })?;
        let op = cmd.name();

        let result = self.control_plane.execute(cmd);
        info!(step = index, op, ok = result.is_ok(), "scenario step");

        match (&result, &step.expect_error) {
            (Ok(_), Some(expected)) => {
                return Err(ScenarioError::ExpectedFailure {
                    index,
                    op,
                    expected: expected.clone(),
                });
            }
            (Err(error), Some(expected)) if error.kind() != expected.as_str() => {
                return Err(ScenarioError::WrongFailure {
                    index,
                    op,
                    expected: expected.clone(),
                    error: error.clone(),
                });
            }
            (Err(error), None) => {
                return Err(ScenarioError::Failed {
                    index,
                    op,
                    error: error.clone(),
                });
            }
            _ => {}
        }

        if let (Ok(response), Some(name)) = (&result, &step.bind) {
            let id = response
                .resource_id()
                .ok_or_else(|| ScenarioError::NothingToBind {
                    index,
                    op,
                    name: name.clone(),
                })?;
            self.bindings.insert(name.clone(), id.to_string());
        }

        Ok(StepOutcome { index, op, result })
    }

    fn substitute(&self, index: usize, value: &Value) -> Result<Value, ScenarioError> {
        Ok(match value {
            Value::String(s) => match s.strip_prefix('$') {
                Some(name) => {
                    let id = self.bindings.get(name).ok_or_else(|| {
                        ScenarioError::UnknownBinding {
                            index,
                            name: name.to_string(),
                        }
                    })?;
                    Value::String(id.clone())
                }
                None => value.clone(),
            },
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.substitute(index, item))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| self.substitute(index, v).map(|v| (k.clone(), v)))
                    .collect::<Result<Map<String, Value>, _>>()?,
            ),
            other => other.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SdnState;

    fn control_plane() -> ControlPlane {
        ControlPlane::new(SdnState::new("tenant-s"))
    }

    #[test]
    fn test_bindings_and_expected_errors() {
        let cp = control_plane();
        let scenario = Scenario::parse(
            r#"{"steps": [
                {"op": "create_network", "body": {"network": {}}, "bind": "net"},
                {"op": "create_port", "body": {"port": {"network_id": "$net"}}, "bind": "port"},
                {"op": "delete_network", "id": "$net", "expect_error": "ResourceInUse"},
                {"op": "delete_port", "id": "$port"},
                {"op": "delete_network", "id": "$net"}
            ]}"#,
        )
        .unwrap();

        let mut runner = ScenarioRunner::new(&cp);
        let outcomes = runner.run(&scenario).unwrap();
        assert_eq!(outcomes.len(), 5);
        assert!(outcomes[2].result.is_err());
        assert_eq!(outcomes[2].to_json()["error"]["kind"], "ResourceInUse");
        assert_eq!(outcomes[4].op, "delete_network");

        let net_id = runner.binding("net").unwrap();
        assert!(cp.with_state(|s| s.get_network(net_id).is_none()));
    }

    #[test]
    fn test_unknown_binding() {
        let cp = control_plane();
        let scenario =
            Scenario::parse(r#"{"steps": [{"op": "delete_router", "id": "$nope"}]}"#).unwrap();
        let result = ScenarioRunner::new(&cp).run(&scenario);
        assert!(matches!(
            result,
            Err(ScenarioError::UnknownBinding { index: 0, ref name }) if name == "nope"
        ));
    }

    #[test]
    fn test_unexpected_outcomes() {
        let cp = control_plane();
        let mut runner = ScenarioRunner::new(&cp);

        let scenario = Scenario::parse(
            r#"{"steps": [
                {"op": "create_router", "body": {"router": {}}, "expect_error": "MissingField"}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            runner.run(&scenario),
            Err(ScenarioError::ExpectedFailure { index: 0, .. })
        ));

        let scenario = Scenario::parse(
            r#"{"steps": [{"op": "delete_port", "id": "x", "expect_error": "ResourceNotFound"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            runner.run(&scenario),
            Err(ScenarioError::WrongFailure { .. })
        ));

        let scenario =
            Scenario::parse(r#"{"steps": [{"op": "delete_port", "id": "x"}]}"#).unwrap();
        assert!(matches!(
            runner.run(&scenario),
            Err(ScenarioError::Failed {
                error: SdnError::PortNotFound(_),
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_step_and_nothing_to_bind() {
        let cp = control_plane();
        let mut runner = ScenarioRunner::new(&cp);

        let scenario = Scenario::parse(r#"{"steps": [{"op": "launch_rocket"}]}"#).unwrap();
        assert!(matches!(
            runner.run(&scenario),
            Err(ScenarioError::InvalidStep { index: 0, .. })
        ));

        let scenario =
            Scenario::parse(r#"{"steps": [{"op": "list_routers", "bind": "all"}]}"#).unwrap();
        assert!(matches!(
            runner.run(&scenario),
            Err(ScenarioError::NothingToBind { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, r#"{"steps": [{"op": "list_networks"}]}"#).unwrap();

        let scenario = Scenario::from_file(&path).unwrap();
        assert_eq!(scenario.steps.len(), 1);
        assert!(matches!(
            Scenario::from_file(dir.path().join("missing.json")),
            Err(ScenarioError::Io(_))
        ));
    }
}
