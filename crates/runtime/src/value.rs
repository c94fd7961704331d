//! Dynamically typed values exchanged with the JavaScript side.

use std::fmt;

/// A JavaScript-compatible value.
///
/// Object fields keep their insertion order so marshaled structs read back in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JavaScript `null` or `undefined`
    Null,
    /// Boolean
    Bool(bool),
    /// Number; always a double
    Number(f64),
    /// String
    String(String),
    /// Array
    Array(Vec<Value>),
    /// Plain object, fields in insertion order
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Name of the value's kind, used in type mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Look up an object field by name. Returns `None` for non-objects.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.iter().find(|(key, _)| key == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(fields) => {
                f.write_str("{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {key}: {value}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let value = Value::Object(vec![
            ("foo".to_string(), Value::String("a".to_string())),
            ("bar".to_string(), Value::Null),
        ]);
        assert_eq!(value.field("foo"), Some(&Value::String("a".to_string())));
        assert_eq!(value.field("bar"), Some(&Value::Null));
        assert_eq!(value.field("baz"), None);
        assert_eq!(Value::Null.field("foo"), None);
    }

    #[test]
    fn test_display() {
        let value = Value::Object(vec![
            ("a".to_string(), Value::Array(vec![Value::Number(1.0), Value::Bool(true)])),
            ("b".to_string(), Value::String("x".to_string())),
        ]);
        assert_eq!(value.to_string(), "{ a: [1, true], b: \"x\" }");
    }
}
