//! Request payload validation.
//!
//! Bodies arrive as loose JSON objects. Before the emulator touches a store,
//! each body is checked against a schema of required keys and optional keys
//! with defaults, then converted into a typed request. Updates go through
//! [`merge`], which overlays fields onto a typed resource.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Result, SdnError};

/// A JSON object as received from a caller.
pub type Payload = Map<String, Value>;

/// Check `input` against a schema and fill in defaults.
///
/// The output holds every required key as supplied and every optional key
/// (the keys of `defaults`), supplied value first. Missing required keys are
/// reported before unexpected ones.
pub fn validate(input: &Payload, required: &[&str], defaults: Payload) -> Result<Payload> {
    let mut missing: Vec<String> = required
        .iter()
        .filter(|key| !input.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        missing.dedup();
        return Err(SdnError::MissingField(missing));
    }

    let mut unexpected: Vec<String> = input
        .keys()
        .filter(|key| !required.contains(&key.as_str()) && !defaults.contains_key(key.as_str()))
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        unexpected.sort();
        return Err(SdnError::UnknownField(unexpected));
    }

    let mut output = defaults;
    for (key, value) in input {
        output.insert(key.clone(), value.clone());
    }
    Ok(output)
}

/// Borrow a body as a JSON object.
pub fn expect_object(body: &Value) -> Result<&Payload> {
    body.as_object()
        .ok_or_else(|| SdnError::InvalidPayload("request body must be a JSON object".to_string()))
}

/// Unwrap a `{"<resource>": {...}}` body into its inner object.
pub fn unwrap_envelope(body: &Value, resource: &str) -> Result<Payload> {
    let mut outer = validate(expect_object(body)?, &[resource], Map::new())?;
    match outer.remove(resource) {
        Some(Value::Object(inner)) => Ok(inner),
        _ => Err(SdnError::InvalidPayload(format!(
            "'{}' must be a JSON object",
            resource
        ))),
    }
}

/// Convert a validated payload into a typed request.
pub fn decode<T: DeserializeOwned>(payload: Payload) -> Result<T> {
    serde_json::from_value(Value::Object(payload))
        .map_err(|e| SdnError::InvalidPayload(e.to_string()))
}

/// Shallow-merge `patch` onto a copy of `resource`.
///
/// Only fields the resource already has may be overwritten, and `id` never.
/// The stored value is untouched; callers swap in the result on success.
pub fn merge<T: Serialize + DeserializeOwned>(resource: &T, patch: &Payload) -> Result<T> {
    if patch.contains_key("id") {
        return Err(SdnError::InvalidPayload("field 'id' is read-only".to_string()));
    }

    let mut fields = match serde_json::to_value(resource) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            return Err(SdnError::InvalidPayload(
                "resource does not serialize to an object".to_string(),
            ));
        }
        Err(e) => return Err(SdnError::InvalidPayload(e.to_string())),
    };

    let mut unknown: Vec<String> = patch
        .keys()
        .filter(|key| !fields.contains_key(key.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        return Err(SdnError::UnknownField(unknown));
    }

    for (key, value) in patch {
        fields.insert(key.clone(), value.clone());
    }
    decode(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn object(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("Expected object, got: {:?}", other),
        }
    }

    #[test]
    fn test_validate_applies_defaults() {
        let input = object(json!({"network_id": "n1"}));
        let defaults = object(json!({"name": "port_abc", "admin_state_up": true}));

        let output = validate(&input, &["network_id"], defaults).unwrap();
        assert_eq!(output["network_id"], "n1");
        assert_eq!(output["name"], "port_abc");
        assert_eq!(output["admin_state_up"], true);
    }

    #[test]
    fn test_validate_supplied_value_wins() {
        let input = object(json!({"name": "custom"}));
        let defaults = object(json!({"name": "net_generated"}));

        let output = validate(&input, &[], defaults).unwrap();
        assert_eq!(output["name"], "custom");
    }

    #[test]
    fn test_validate_missing_checked_before_unknown() {
        let input = object(json!({"bogus": 1}));
        let result = validate(&input, &["network_id", "cidr"], Map::new());
        assert_eq!(
            result,
            Err(SdnError::MissingField(vec![
                "cidr".to_string(),
                "network_id".to_string()
            ]))
        );
    }

    #[test]
    fn test_validate_unknown_field() {
        let input = object(json!({"network_id": "n1", "shared": true, "zone": "a"}));
        let result = validate(&input, &["network_id"], Map::new());
        assert_eq!(
            result,
            Err(SdnError::UnknownField(vec![
                "shared".to_string(),
                "zone".to_string()
            ]))
        );
    }

    #[test]
    fn test_unwrap_envelope() {
        let inner = unwrap_envelope(&json!({"network": {"name": "n"}}), "network").unwrap();
        assert_eq!(inner["name"], "n");

        assert_eq!(
            unwrap_envelope(&json!({"name": "n"}), "network"),
            Err(SdnError::MissingField(vec!["network".to_string()]))
        );
        assert!(matches!(
            unwrap_envelope(&json!({"network": {}, "subnet": {}}), "network"),
            Err(SdnError::UnknownField(_))
        ));
        assert!(matches!(
            unwrap_envelope(&json!({"network": "n"}), "network"),
            Err(SdnError::InvalidPayload(_))
        ));
        assert!(matches!(
            unwrap_envelope(&json!([1, 2]), "network"),
            Err(SdnError::InvalidPayload(_))
        ));
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Thing {
        id: String,
        label: String,
        enabled: bool,
    }

    fn thing() -> Thing {
        Thing {
            id: "t1".to_string(),
            label: "old".to_string(),
            enabled: true,
        }
    }

    #[test]
    fn test_merge_overwrites_named_fields() {
        let merged = merge(&thing(), &object(json!({"label": "new"}))).unwrap();
        assert_eq!(merged.label, "new");
        assert!(merged.enabled);
        assert_eq!(merged.id, "t1");
    }

    #[test]
    fn test_merge_rejects_unknown_and_read_only() {
        assert_eq!(
            merge(&thing(), &object(json!({"colour": "red"}))),
            Err(SdnError::UnknownField(vec!["colour".to_string()]))
        );
        assert!(matches!(
            merge(&thing(), &object(json!({"id": "t2"}))),
            Err(SdnError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_merge_rejects_wrong_type() {
        let result = merge(&thing(), &object(json!({"enabled": "yes"})));
        assert!(matches!(result, Err(SdnError::InvalidPayload(_))));
    }
}
