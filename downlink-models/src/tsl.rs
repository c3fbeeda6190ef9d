use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Thing specification: the property schema of a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tsl {
    #[serde(default)]
    pub properties: Vec<TslProperty>,
}

impl Tsl {
    /// Look up a property definition by key.
    pub fn property(&self, key: &str) -> Option<&TslProperty> {
        self.properties.iter().find(|p| p.key == key)
    }
}

/// A single declared property of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TslProperty {
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub value_type: ValueKind,
}

/// Declared value type of a TSL property.
///
/// `coerce` performs type coercion only; full schema validation is not
/// the routing core's job. Values that cannot be coerced are passed
/// through unchanged so the device sees what the caller sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int32,
    Int64,
    Float,
    Double,
    Text,
}

impl ValueKind {
    pub fn coerce(&self, value: Value) -> Value {
        match self {
            ValueKind::Bool => coerce_bool(value),
            ValueKind::Int32 | ValueKind::Int64 => coerce_integer(value),
            ValueKind::Float | ValueKind::Double => coerce_float(value),
            ValueKind::Text => coerce_text(value),
        }
    }
}

fn coerce_bool(value: Value) -> Value {
    match &value {
        Value::Bool(_) => value,
        Value::Number(n) => Value::Bool(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => value,
        },
        _ => value,
    }
}

fn coerce_integer(value: Value) -> Value {
    match &value {
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                value
            } else {
                // Truncate fractional numbers toward zero.
                n.as_f64()
                    .map(|f| Value::from(f as i64))
                    .unwrap_or(value)
            }
        }
        Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(value),
        Value::Bool(b) => Value::from(i64::from(*b)),
        _ => value,
    }
}

fn coerce_float(value: Value) -> Value {
    match &value {
        Value::Number(_) => value,
        Value::String(s) => s
            .parse::<f64>()
            .ok()
            .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
            .unwrap_or(value),
        _ => value,
    }
}

fn coerce_text(value: Value) -> Value {
    match &value {
        Value::String(_) => value,
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer_from_string() {
        assert_eq!(ValueKind::Int32.coerce(json!("42")), json!(42));
    }

    #[test]
    fn test_coerce_integer_truncates_float() {
        assert_eq!(ValueKind::Int64.coerce(json!(3.9)), json!(3));
    }

    #[test]
    fn test_coerce_bool_from_number() {
        assert_eq!(ValueKind::Bool.coerce(json!(1)), json!(true));
        assert_eq!(ValueKind::Bool.coerce(json!(0)), json!(false));
    }

    #[test]
    fn test_coerce_text_from_number() {
        assert_eq!(ValueKind::Text.coerce(json!(26)), json!("26"));
    }

    #[test]
    fn test_uncoercible_value_passes_through() {
        assert_eq!(ValueKind::Int32.coerce(json!("abc")), json!("abc"));
        assert_eq!(ValueKind::Float.coerce(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_tsl_property_lookup() {
        let tsl = Tsl {
            properties: vec![TslProperty {
                key: "switch".to_string(),
                name: String::new(),
                value_type: ValueKind::Bool,
            }],
        };
        assert!(tsl.property("switch").is_some());
        assert!(tsl.property("missing").is_none());
    }
}
