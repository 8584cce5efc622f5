//! Typed configuration values.
//!
//! A [`Value`] holds exactly one of the supported [`Kind`]s. Its kind is
//! fixed when it is constructed; [`Value::set_from_text`] re-parses text
//! into the same kind and leaves the value untouched on failure.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::ConfigError;

/// The closed set of value shapes a configuration key can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Kind {
    Integer,
    Float,
    Text,
    FloatList,
}

impl Kind {
    /// Canonical name, as written in generated files and schema documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::FloatList => "float_list",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(Self::Integer),
            "float" | "double" => Ok(Self::Float),
            "text" | "string" => Ok(Self::Text),
            "float_list" | "list" | "vector<double>" => Ok(Self::FloatList),
            _ => Err(ConfigError::UnknownKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for Kind {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A configuration value of one fixed [`Kind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    FloatList(Vec<f64>),
}

impl Value {
    /// Parses `text` as a value of the given kind.
    ///
    /// Integer text must be integral: `"1.5"` is a parse error rather than
    /// being truncated. Float list elements are comma separated and empty
    /// elements are skipped, so `"1.0,,3.0"` yields `[1.0, 3.0]` and the
    /// empty string yields an empty list. Text is taken verbatim.
    pub fn parse(kind: Kind, text: &str) -> Result<Self, ConfigError> {
        let parse_error = || ConfigError::Parse {
            kind,
            text: text.to_string(),
        };

        match kind {
            Kind::Integer => text
                .trim()
                .parse::<i64>()
                .map(Self::Integer)
                .map_err(|_| parse_error()),
            Kind::Float => text
                .trim()
                .parse::<f64>()
                .map(Self::Float)
                .map_err(|_| parse_error()),
            Kind::Text => Ok(Self::Text(text.to_string())),
            Kind::FloatList => text
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| item.parse::<f64>().map_err(|_| parse_error()))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::FloatList),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Integer(_) => Kind::Integer,
            Self::Float(_) => Kind::Float,
            Self::Text(_) => Kind::Text,
            Self::FloatList(_) => Kind::FloatList,
        }
    }

    /// Renders the value as it is written to a config file.
    pub fn to_text(&self) -> String {
        match self {
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => format_float(*f),
            Self::Text(s) => s.clone(),
            Self::FloatList(items) => items
                .iter()
                .map(|f| format_float(*f))
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Re-parses `text` into this value's own kind.
    ///
    /// On failure the current value is left unchanged.
    pub fn set_from_text(&mut self, text: &str) -> Result<(), ConfigError> {
        *self = Self::parse(self.kind(), text)?;
        Ok(())
    }

    /// Borrows the inner value if it has the kind of `T`.
    pub fn get<T: ConfigType>(&self) -> Option<&T> {
        T::from_value(self)
    }

    /// Numeric view used by the bound-checking rules.
    ///
    /// Text counts as numeric when it parses as a float.
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::FloatList(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// Debug formatting is the shortest text that parses back to the same f64
// and always carries a decimal point or exponent.
fn format_float(f: f64) -> String {
    format!("{f:?}")
}

/// Rust types that map one-to-one onto a [`Kind`].
///
/// Implemented for `i64`, `f64`, `String` and `Vec<f64>`; these drive the
/// generic getters and setters on sections and the store.
pub trait ConfigType: Clone + Sized {
    const KIND: Kind;

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Option<&Self>;
}

impl ConfigType for i64 {
    const KIND: Kind = Kind::Integer;

    fn into_value(self) -> Value {
        Value::Integer(self)
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }
}

impl ConfigType for f64 {
    const KIND: Kind = Kind::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }
}

impl ConfigType for String {
    const KIND: Kind = Kind::Text;

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl ConfigType for Vec<f64> {
    const KIND: Kind = Kind::FloatList;

    fn into_value(self) -> Value {
        Value::FloatList(self)
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::FloatList(items) => Some(items),
            _ => None,
        }
    }
}

macro_rules! impl_from_config_type {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    value.into_value()
                }
            }
        )*
    };
}

impl_from_config_type!(i64, f64, String, Vec<f64>);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
