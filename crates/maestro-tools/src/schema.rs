//! Schema - Typed parameter declarations and argument coercion
//!
//! Models produce tool arguments as text, so numbers and booleans often
//! arrive as strings. Each tool declares its parameters with a [`ParamType`]
//! and [`coerce`] converts a raw JSON value into that type before dispatch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Declared type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// UTF-8 text
    String,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit float
    Float,
    /// Boolean (permissive string parsing)
    Boolean,
    /// JSON object, passed through
    Object,
    /// JSON array, passed through
    Array,
    /// Anything, passed through
    Any,
}

impl ParamType {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single declared parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// Human-readable description
    pub description: String,
    /// Whether the caller must supply it
    pub required: bool,
    /// Value used when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required parameter
    #[must_use]
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// An optional parameter with a default value
    #[must_use]
    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: false,
            default: Some(default),
        }
    }
}

/// Failure converting a raw value to its declared type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {value} to {expected}")]
pub struct CoercionError {
    /// Declared type
    pub expected: ParamType,
    /// Offending value, rendered as JSON
    pub value: String,
}

impl CoercionError {
    fn new(expected: ParamType, value: &Value) -> Self {
        Self {
            expected,
            value: value.to_string(),
        }
    }
}

/// Text form used for permissive parsing (`"5"` and `5` both read as `5`)
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Convert `value` to the declared type.
///
/// Integer and float accept numbers and numeric strings. Boolean is true for
/// `true`, `1` or `yes` (case-insensitive) and false for any other scalar.
/// Object, array and any are returned unchanged.
pub fn coerce(param_type: ParamType, value: Value) -> Result<Value, CoercionError> {
    match param_type {
        ParamType::Integer => match &value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => Ok(Value::from(f as i64)),
                _ => Err(CoercionError::new(param_type, &value)),
            },
            Value::Bool(b) => Ok(Value::from(i64::from(*b))),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| CoercionError::new(param_type, &value)),
            _ => Err(CoercionError::new(param_type, &value)),
        },
        ParamType::Float => {
            let parsed = match &value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| CoercionError::new(param_type, &value))
        }
        ParamType::Boolean => match &value {
            Value::Bool(_) => Ok(value),
            other => match scalar_text(other) {
                Some(text) => Ok(Value::Bool(matches!(
                    text.to_lowercase().as_str(),
                    "true" | "1" | "yes"
                ))),
                None => Err(CoercionError::new(param_type, &value)),
            },
        },
        ParamType::String => match &value {
            Value::String(_) => Ok(value),
            Value::Number(_) | Value::Bool(_) => Ok(Value::String(value.to_string())),
            _ => Err(CoercionError::new(param_type, &value)),
        },
        ParamType::Object | ParamType::Array | ParamType::Any => Ok(value),
    }
}

/// Error produced while preparing a full argument map
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// A required parameter was not supplied
    #[error("missing required argument '{0}'")]
    Missing(String),
    /// A supplied value could not be converted
    #[error("invalid argument '{name}': {source}")]
    Invalid {
        /// Parameter name
        name: String,
        /// Underlying coercion failure
        source: CoercionError,
    },
}

/// Coerce every declared parameter in `arguments` and fill in defaults.
///
/// Arguments that are not declared are passed through untouched.
pub fn coerce_arguments(
    params: &[ParamSpec],
    mut arguments: Map<String, Value>,
) -> Result<Map<String, Value>, ArgumentError> {
    for spec in params {
        match arguments.remove(&spec.name) {
            Some(raw) => {
                let typed = coerce(spec.param_type, raw).map_err(|source| ArgumentError::Invalid {
                    name: spec.name.clone(),
                    source,
                })?;
                arguments.insert(spec.name.clone(), typed);
            }
            None => {
                if let Some(default) = &spec.default {
                    arguments.insert(spec.name.clone(), default.clone());
                } else if spec.required {
                    return Err(ArgumentError::Missing(spec.name.clone()));
                }
            }
        }
    }
    Ok(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce(ParamType::Integer, json!("5")).unwrap(), json!(5));
        assert_eq!(coerce(ParamType::Integer, json!(" 12 ")).unwrap(), json!(12));
        assert_eq!(coerce(ParamType::Integer, json!(7)).unwrap(), json!(7));
        assert_eq!(coerce(ParamType::Integer, json!(3.0)).unwrap(), json!(3));
        assert!(coerce(ParamType::Integer, json!("five")).is_err());
        assert!(coerce(ParamType::Integer, json!(2.5)).is_err());
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce(ParamType::Float, json!("0.5")).unwrap(), json!(0.5));
        assert_eq!(coerce(ParamType::Float, json!(2)).unwrap(), json!(2.0));
        assert!(coerce(ParamType::Float, json!([1])).is_err());
    }

    #[test]
    fn test_coerce_boolean_is_permissive() {
        for truthy in [json!("true"), json!("YES"), json!("1"), json!(1), json!(true)] {
            assert_eq!(coerce(ParamType::Boolean, truthy).unwrap(), json!(true));
        }
        for falsy in [json!("no"), json!("false"), json!("0"), json!("maybe"), json!(0)] {
            assert_eq!(coerce(ParamType::Boolean, falsy).unwrap(), json!(false));
        }
        assert!(coerce(ParamType::Boolean, json!({})).is_err());
    }

    #[test]
    fn test_coerce_passthrough() {
        let data = json!({"a": [1, 2]});
        assert_eq!(coerce(ParamType::Any, data.clone()).unwrap(), data);
        assert_eq!(coerce(ParamType::Object, json!("x")).unwrap(), json!("x"));
        assert_eq!(coerce(ParamType::String, json!(42)).unwrap(), json!("42"));
    }

    #[test]
    fn test_coerce_arguments_defaults_and_missing() {
        let params = vec![
            ParamSpec::required("query", ParamType::String, "search query"),
            ParamSpec::optional("max_results", ParamType::Integer, "limit", json!(5)),
        ];

        let args = json!({"query": "rust", "extra": "kept"});
        let prepared = coerce_arguments(&params, args.as_object().unwrap().clone()).unwrap();
        assert_eq!(prepared["max_results"], json!(5));
        assert_eq!(prepared["extra"], json!("kept"));

        let missing = coerce_arguments(&params, Map::new()).unwrap_err();
        assert_eq!(missing, ArgumentError::Missing("query".to_string()));
    }
}
