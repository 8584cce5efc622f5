//! Validation rules attached to configuration keys.
//!
//! Rules are stateless beyond their own parameters. Sections and schemas hold
//! them as [`Arc<Rule>`](std::sync::Arc) so one rule can guard many keys.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use super::value::{ConfigType, Value};

/// A predicate over a [`Value`] plus a human-readable constraint.
///
/// Evaluation never fails: a value of a kind the rule does not understand
/// simply does not satisfy it.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Strictly greater than zero.
    AlwaysPositive,
    /// Greater than or equal to zero.
    NonNegative,
    /// Within `min..=max`.
    InRange { min: f64, max: f64 },
    /// Text equal to one of the allowed values.
    InSet { values: Vec<String> },
    #[serde(skip)]
    Custom(CustomRule),
}

impl Rule {
    pub fn in_range(min: f64, max: f64) -> Self {
        Self::InRange { min, max }
    }

    pub fn in_set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::InSet {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a rule from a predicate over one concrete type.
    ///
    /// Values of any other kind fail the rule.
    ///
    /// ```
    /// use typed_ini::Rule;
    ///
    /// let even = Rule::custom("Must be even", |n: &i64| n % 2 == 0);
    /// assert!(even.evaluate(&4_i64.into()));
    /// assert!(!even.evaluate(&4.0_f64.into()));
    /// ```
    pub fn custom<T, F>(description: impl Into<String>, check: F) -> Self
    where
        T: ConfigType,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::Custom(CustomRule {
            description: description.into(),
            check: Arc::new(move |value: &Value| value.get::<T>().is_some_and(&check)),
        })
    }

    pub fn evaluate(&self, value: &Value) -> bool {
        match self {
            Self::AlwaysPositive => numeric_all(value, |n| n > 0.0),
            Self::NonNegative => numeric_all(value, |n| n >= 0.0),
            Self::InRange { min, max } => numeric_all(value, |n| n >= *min && n <= *max),
            Self::InSet { values } => match value {
                Value::Text(s) => values.iter().any(|allowed| allowed == s),
                _ => false,
            },
            Self::Custom(rule) => (rule.check)(value),
        }
    }

    /// Describes the constraint for generated documentation.
    pub fn describe(&self) -> String {
        match self {
            Self::AlwaysPositive => "Must be greater than 0".to_string(),
            Self::NonNegative => "Must be greater than or equal to 0".to_string(),
            Self::InRange { min, max } => format!("Must be between {min} and {max}"),
            Self::InSet { values } => format!("Must be one of: {}", values.join(", ")),
            Self::Custom(rule) => rule.description.clone(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

// A list satisfies a bound only if every element does; an empty list passes.
fn numeric_all(value: &Value, check: impl Fn(f64) -> bool) -> bool {
    match value {
        Value::FloatList(items) => items.iter().all(|n| check(*n)),
        other => other.as_f64().is_some_and(check),
    }
}

/// A caller-supplied predicate with its description.
#[derive(Clone)]
pub struct CustomRule {
    description: String,
    check: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_positive() {
        let rule = Rule::AlwaysPositive;
        assert!(rule.evaluate(&Value::Float(0.5)));
        assert!(rule.evaluate(&Value::Integer(1)));
        assert!(!rule.evaluate(&Value::Float(0.0)));
        assert!(!rule.evaluate(&Value::Integer(-5)));
    }

    #[test]
    fn test_non_negative_accepts_zero() {
        assert!(Rule::NonNegative.evaluate(&Value::Integer(0)));
        assert!(!Rule::NonNegative.evaluate(&Value::Float(-0.1)));
    }

    #[test]
    fn test_in_range_is_inclusive() {
        let rule = Rule::in_range(0.0, 100.0);
        assert!(rule.evaluate(&Value::Float(0.0)));
        assert!(rule.evaluate(&Value::Float(100.0)));
        assert!(!rule.evaluate(&Value::Float(150.0)));
        assert_eq!(rule.describe(), "Must be between 0 and 100");
    }

    #[test]
    fn test_numeric_rules_read_numeric_text() {
        assert!(Rule::AlwaysPositive.evaluate(&Value::Text("12".into())));
        assert!(!Rule::AlwaysPositive.evaluate(&Value::Text("abc".into())));
    }

    #[test]
    fn test_numeric_rules_check_every_list_element() {
        let rule = Rule::NonNegative;
        assert!(rule.evaluate(&Value::FloatList(vec![0.0, 1.0])));
        assert!(!rule.evaluate(&Value::FloatList(vec![1.0, -1.0])));
    }

    #[test]
    fn test_in_set_only_matches_text() {
        let rule = Rule::in_set(["fast", "slow"]);
        assert!(rule.evaluate(&Value::Text("fast".into())));
        assert!(!rule.evaluate(&Value::Text("medium".into())));
        assert!(!rule.evaluate(&Value::Integer(1)));
        assert_eq!(rule.describe(), "Must be one of: fast, slow");
    }

    #[test]
    fn test_custom_rule_rejects_other_kinds() {
        let rule = Rule::custom("Must have three entries", |items: &Vec<f64>| {
            items.len() == 3
        });
        assert!(rule.evaluate(&Value::FloatList(vec![1.0, 2.0, 3.0])));
        assert!(!rule.evaluate(&Value::FloatList(vec![1.0])));
        assert!(!rule.evaluate(&Value::Text("1,2,3".into())));
        assert_eq!(rule.describe(), "Must have three entries");
    }

    #[test]
    fn test_rule_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            rule: Rule,
        }

        let holder: Holder =
            toml::from_str(r#"rule = { type = "in_range", min = 0, max = 100 }"#).unwrap();
        assert!(matches!(holder.rule, Rule::InRange { min, max } if min == 0.0 && max == 100.0));

        let holder: Holder = toml::from_str(r#"rule = { type = "always_positive" }"#).unwrap();
        assert!(matches!(holder.rule, Rule::AlwaysPositive));
    }
}
