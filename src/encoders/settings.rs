//! # Encoder Configuration Helpers
//!
//! Reading and validating flat key/value configuration maps, and building
//! the JSON schema fragments that describe them.

use std::str::FromStr;

use serde_json::{json, Map, Value};
use tracing::error;

use crate::error::ConfigurationError;

/// Flat key/value configuration of one encoder instance
pub type ConfigMap = Map<String, Value>;

/// Encoder with a runtime-editable parameter set
pub trait Configurable {
    /// JSON schema describing the accepted keys
    fn config_schema(&self) -> Value;

    /// Apply a configuration map.
    ///
    /// Every key is validated before anything is changed, so on error the
    /// previous parameters are kept in full.
    fn set_configuration(&mut self, config: &ConfigMap) -> Result<(), ConfigurationError>;

    /// Current parameters, in the same shape `set_configuration` accepts
    fn configuration(&self) -> ConfigMap;
}

/// Fail with `MissingKey` for the first absent key
pub fn require_keys(owner: &str, config: &ConfigMap, keys: &[&str]) -> Result<(), ConfigurationError> {
    for key in keys {
        if !config.contains_key(*key) {
            error!("{}: Missing configuration key {}", owner, key);
            return Err(ConfigurationError::MissingKey((*key).to_string()));
        }
    }
    Ok(())
}

/// Read an integer key bounded to `0..=max`
pub fn read_instance(config: &ConfigMap, key: &str, max: u8) -> Result<u8, ConfigurationError> {
    let value = required(config, key)?;
    value
        .as_u64()
        .filter(|&v| v <= u64::from(max))
        .map(|v| v as u8)
        .ok_or_else(|| invalid(key, format!("expected an integer between 0 and {}, got {}", max, value)))
}

/// Read a finite, non-negative number
pub fn read_non_negative(config: &ConfigMap, key: &str) -> Result<f64, ConfigurationError> {
    let value = required(config, key)?;
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| invalid(key, format!("expected a non-negative number, got {}", value)))
}

/// Resolve a string key against a fixed enumeration
pub fn read_enum<T: FromStr>(config: &ConfigMap, key: &str) -> Result<T, ConfigurationError> {
    let value = required(config, key)?;
    let text = value
        .as_str()
        .ok_or_else(|| invalid(key, format!("expected a string, got {}", value)))?;
    text.parse().map_err(|_| ConfigurationError::UnknownEnumValue {
        key: key.to_string(),
        value: text.to_string(),
    })
}

/// JSON number for a stored `f64`, written as an integer when it is whole
/// so that `100` reads back as `100` rather than `100.0`
pub fn number_value(value: f64) -> Value {
    // integers above 2^53 are not exact in an f64
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// Schema fragment for an integer key
pub fn integer_property(title: &str) -> Value {
    json!({ "title": title, "type": "integer" })
}

/// Schema fragment for a number key
pub fn number_property(title: &str) -> Value {
    json!({ "title": title, "type": "number" })
}

/// Schema fragment for a key restricted to literal strings
pub fn enum_property<'a>(title: &str, values: impl IntoIterator<Item = &'a str>) -> Value {
    let values: Vec<&str> = values.into_iter().collect();
    json!({ "title": title, "type": "string", "enum": values })
}

/// Wrap properties into an object schema
pub fn object_schema(properties: ConfigMap) -> Value {
    json!({ "type": "object", "properties": properties })
}

fn required<'a>(config: &'a ConfigMap, key: &str) -> Result<&'a Value, ConfigurationError> {
    config
        .get(key)
        .ok_or_else(|| ConfigurationError::MissingKey(key.to_string()))
}

fn invalid(key: &str, reason: String) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        key: key.to_string(),
        reason,
    }
}
