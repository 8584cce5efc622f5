use std::collections::BTreeMap;
use std::sync::Arc;

use super::rule::Rule;
use super::value::{ConfigType, Value};
use super::ConfigError;

/// A named group of keys, mirroring one `[Header]` block of a config file.
///
/// Keys are case-sensitive. A key may carry a [`Rule`]; when it does, every
/// value committed under that key satisfies the rule at the moment it is
/// stored, and a rejected value leaves the previous one in place.
#[derive(Debug, Clone, Default)]
pub struct Section {
    values: BTreeMap<String, Value>,
    rules: BTreeMap<String, Arc<Rule>>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a typed value under `key`, checking the key's rule first.
    pub fn set_value<T: ConfigType>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<(), ConfigError> {
        self.set(key, value.into_value())
    }

    /// Stores `value` under `key`, checking the key's rule first.
    ///
    /// A value of a different kind replaces the stored one outright.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<(), ConfigError> {
        let key = key.into();
        if let Some(rule) = self.rules.get(&key) {
            if !rule.evaluate(&value) {
                return Err(ConfigError::Validation {
                    key,
                    rule: rule.describe(),
                });
            }
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Returns a copy of the value under `key` as `T`.
    pub fn get_value<T: ConfigType>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        value
            .get::<T>()
            .cloned()
            .ok_or_else(|| ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: T::KIND,
                found: value.kind(),
            })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Installs or replaces the rule for `key`.
    ///
    /// The value currently stored under `key` is not re-checked.
    pub fn set_validation_rule(&mut self, key: impl Into<String>, rule: Arc<Rule>) {
        self.rules.insert(key.into(), rule);
    }

    pub fn rule(&self, key: &str) -> Option<&Arc<Rule>> {
        self.rules.get(key)
    }

    /// Iterates over keys and values in key order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
