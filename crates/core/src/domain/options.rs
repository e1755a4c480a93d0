// Render Options - key/value map translated into tool command-line flags

use super::error::{DomainError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum option key length (bytes)
pub const MAX_OPTION_KEY_LEN: usize = 64;

/// Largest float that still round-trips through i64 without losing precision
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0; // 2^53

/// Value of a single render option
///
/// `Flag` options are emitted without a value (`--sketch`), everything else as
/// `--key=value`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Flag,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl OptionValue {
    /// Convert a JSON scalar into an option value
    ///
    /// `null` and `""` both mean "flag without a value". Arrays and objects
    /// have no command-line form and are rejected.
    pub fn from_json(key: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(OptionValue::Flag),
            Value::String(s) if s.is_empty() => Ok(OptionValue::Flag),
            Value::String(s) => Ok(OptionValue::Text(s)),
            Value::Bool(b) => Ok(OptionValue::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(OptionValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT {
                        Ok(OptionValue::Integer(f as i64))
                    } else if n.is_u64() {
                        // Beyond i64 but still an exact integer
                        Ok(OptionValue::Text(n.to_string()))
                    } else {
                        Ok(OptionValue::Float(f))
                    }
                } else {
                    Ok(OptionValue::Text(n.to_string()))
                }
            }
            Value::Array(_) => Err(DomainError::InvalidOptionValue {
                key: key.to_string(),
                reason: "arrays are not supported".to_string(),
            }),
            Value::Object(_) => Err(DomainError::InvalidOptionValue {
                key: key.to_string(),
                reason: "objects are not supported".to_string(),
            }),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Flag => Ok(()),
            OptionValue::Text(s) => write!(f, "{}", s),
            OptionValue::Integer(i) => write!(f, "{}", i),
            OptionValue::Float(x) => write!(f, "{}", x),
            OptionValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            OptionValue::Flag
        } else {
            OptionValue::Text(s.to_string())
        }
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Integer(i)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

/// Ordered option map
///
/// Keys are kept sorted so the generated argv is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions(BTreeMap<String, OptionValue>);

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and convert a JSON object into render options
    pub fn from_json_map(map: Map<String, Value>) -> Result<Self> {
        let mut options = BTreeMap::new();
        for (key, value) in map {
            validate_key(&key)?;
            let value = OptionValue::from_json(&key, value)?;
            options.insert(key, value);
        }
        Ok(Self(options))
    }

    /// Insert a validated option, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;
        self.0.insert(key, value.into());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.0.iter()
    }

    /// Translate into command-line flags, one argv element per option
    pub fn to_flags(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(key, value)| match value {
                OptionValue::Flag => format!("--{}", key),
                other => format!("--{}={}", key, other),
            })
            .collect()
    }
}

/// Validate an option key
///
/// Keys become `--<key>` on the command line, so they are restricted to
/// characters that cannot change how the tool parses its argv.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let invalid = |reason: &str| DomainError::InvalidOptionKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("key cannot be empty"));
    }

    if key.len() > MAX_OPTION_KEY_LEN {
        return Err(invalid(&format!(
            "key too long (max {} bytes)",
            MAX_OPTION_KEY_LEN
        )));
    }

    if key.starts_with('-') {
        return Err(invalid("key must not start with '-'"));
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid(
            "key must contain only alphanumeric characters, '-' or '_'",
        ));
    }

    Ok(())
}
