use crate::diagnostic::DiagnosticCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The declared type of a block property, with its validation rules.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyType {
    String {
        #[serde(default, alias = "maxLength")]
        max_length: Option<usize>,
    },
    Integer {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    Boolean,
    Enum {
        values: Vec<String>,
    },
}

impl PropertyType {
    fn name(&self) -> &'static str {
        match self {
            PropertyType::String { .. } => "string",
            PropertyType::Integer { .. } => "integer",
            PropertyType::Boolean => "boolean",
            PropertyType::Enum { .. } => "enum",
        }
    }
}

/// One named, typed field of a block kind's property schema.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PropertyDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
}

/// A property value after it has been checked against its schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Bool(bool),
    /// One of the schema's allowed values, rendered verbatim.
    Enum(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Str(s) => write!(f, "{:?}", s),
            PropertyValue::Int(n) => write!(f, "{}", n),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Enum(v) => write!(f, "{}", v),
        }
    }
}

/// Why a supplied value does not satisfy its property definition.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyViolation {
    pub code: DiagnosticCode,
    pub message: String,
}

impl PropertyViolation {
    fn wrong_type(expected: &str, found: &Value) -> Self {
        Self {
            code: DiagnosticCode::InvalidPropertyType,
            message: format!("expected {}, found {}", expected, describe_json(found)),
        }
    }

    fn out_of_range(message: String) -> Self {
        Self {
            code: DiagnosticCode::PropertyOutOfRange,
            message,
        }
    }
}

impl PropertyDefinition {
    /// Checks `value` against this definition and converts it into a typed value.
    pub fn check(&self, value: &Value) -> Result<PropertyValue, PropertyViolation> {
        match &self.property_type {
            PropertyType::String { max_length } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| PropertyViolation::wrong_type("a string", value))?;
                if let Some(max) = max_length {
                    let len = s.chars().count();
                    if len > *max {
                        return Err(PropertyViolation::out_of_range(format!(
                            "string of {} characters exceeds the maximum of {}",
                            len, max
                        )));
                    }
                }
                Ok(PropertyValue::Str(s.to_string()))
            }
            PropertyType::Integer { min, max } => {
                let n = as_integer(value)
                    .ok_or_else(|| PropertyViolation::wrong_type("an integer", value))?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(PropertyViolation::out_of_range(format!(
                            "{} is below the minimum of {}",
                            n, min
                        )));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(PropertyViolation::out_of_range(format!(
                            "{} is above the maximum of {}",
                            n, max
                        )));
                    }
                }
                Ok(PropertyValue::Int(n))
            }
            PropertyType::Boolean => value
                .as_bool()
                .map(PropertyValue::Bool)
                .ok_or_else(|| PropertyViolation::wrong_type("a boolean", value)),
            PropertyType::Enum { values } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| PropertyViolation::wrong_type("an enum value", value))?;
                if values.iter().any(|allowed| allowed == s) {
                    Ok(PropertyValue::Enum(s.to_string()))
                } else {
                    Err(PropertyViolation::out_of_range(format!(
                        "'{}' is not one of [{}]",
                        s,
                        values.join(", ")
                    )))
                }
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.property_type.name()
    }
}

/// Accepts JSON integers, and floats without a fractional part.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn describe_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn timeout() -> PropertyDefinition {
        PropertyDefinition {
            id: "timeout_ms".to_string(),
            name: "Timeout".to_string(),
            property_type: PropertyType::Integer {
                min: Some(0),
                max: Some(60_000),
            },
            default: Some(json!(0)),
            required: false,
        }
    }

    #[test]
    fn integer_rejects_numeric_strings() {
        let err = timeout().check(&json!("500")).unwrap_err();
        assert_eq!(err.code, DiagnosticCode::InvalidPropertyType);
        assert!(err.message.contains("string"));
    }

    #[test]
    fn integer_accepts_whole_floats_and_checks_range() {
        assert_eq!(timeout().check(&json!(250.0)), Ok(PropertyValue::Int(250)));
        let err = timeout().check(&json!(70_000)).unwrap_err();
        assert_eq!(err.code, DiagnosticCode::PropertyOutOfRange);
    }

    #[test]
    fn enum_only_accepts_listed_values() {
        let def = PropertyDefinition {
            id: "key".to_string(),
            name: String::new(),
            property_type: PropertyType::Enum {
                values: vec!["InputKeyOk".to_string(), "InputKeyBack".to_string()],
            },
            default: None,
            required: true,
        };
        assert_eq!(
            def.check(&json!("InputKeyOk")),
            Ok(PropertyValue::Enum("InputKeyOk".to_string()))
        );
        assert!(def.check(&json!("InputKeyOk); exit(0")).is_err());
    }
}
