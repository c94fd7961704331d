//! Conversions between [`Value`] and native Rust types.

use thiserror::Error;

use crate::value::Value;

/// Errors raised while dispatching a call into a native module.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvokeError {
    /// Wrong number of arguments
    #[error("{method} expects {expected} argument(s), got {actual}")]
    Arity {
        /// JavaScript method name
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Received argument count
        actual: usize,
    },
    /// A value of the wrong kind
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        /// Kind the native type requires
        expected: &'static str,
        /// Kind that was received
        actual: &'static str,
    },
    /// A number that is not an integral `i32`
    #[error("{0} is not representable as a 32-bit integer")]
    Overflow(f64),
    /// A string outside an enum's declared values
    #[error("`{value}` is not a variant of {enum_name}")]
    UnknownVariant {
        /// Enum type name
        enum_name: &'static str,
        /// Received string
        value: String,
    },
    /// No method of that name on the module
    #[error("module {module} has no method `{method}`")]
    UnknownMethod {
        /// Registry name of the module
        module: String,
        /// Requested method name
        method: String,
    },
    /// Conversion of a positional argument failed
    #[error("argument {index}: {source}")]
    Argument {
        /// Zero-based argument position
        index: usize,
        /// Conversion error
        #[source]
        source: Box<InvokeError>,
    },
    /// Conversion of an object field failed
    #[error("field `{field}`: {source}")]
    Field {
        /// Wire name of the field
        field: String,
        /// Conversion error
        #[source]
        source: Box<InvokeError>,
    },
}

impl InvokeError {
    fn mismatch(expected: &'static str, actual: &Value) -> Self {
        InvokeError::TypeMismatch {
            expected,
            actual: actual.type_name(),
        }
    }
}

/// Convert a [`Value`] received from JavaScript into a native type.
pub trait FromValue: Sized {
    /// Convert, failing if the value has the wrong shape.
    fn from_value(value: Value) -> Result<Self, InvokeError>;
}

/// Convert a native type into a [`Value`] returned to JavaScript.
pub trait IntoValue {
    /// Convert into a value.
    fn into_value(self) -> Value;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        Ok(value)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Null => Ok(()),
            other => Err(InvokeError::mismatch("null", &other)),
        }
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(InvokeError::mismatch("boolean", &other)),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Number(n) => Ok(n),
            other => Err(InvokeError::mismatch("number", &other)),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Number(self)
    }
}

/// JavaScript numbers are doubles; only integral values within `i32` range
/// convert without loss.
impl FromValue for i32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Number(n) => {
                if n.fract() == 0.0 && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX) {
                    Ok(n as i32)
                } else {
                    Err(InvokeError::Overflow(n))
                }
            }
            other => Err(InvokeError::mismatch("number", &other)),
        }
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Number(f64::from(self))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(InvokeError::mismatch("string", &other)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(InvokeError::mismatch("array", &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

/// `null` is the only absent representation; it never collides with a value of `T`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(value) => value.into_value(),
            None => Value::Null,
        }
    }
}

/// Positional call arguments with an arity check up front.
#[derive(Debug)]
pub struct Args {
    values: std::vec::IntoIter<Value>,
    index: usize,
}

impl Args {
    /// Take the call's arguments, failing unless exactly `expected` were passed.
    pub fn new(method: &str, values: Vec<Value>, expected: usize) -> Result<Self, InvokeError> {
        if values.len() != expected {
            return Err(InvokeError::Arity {
                method: method.to_string(),
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            values: values.into_iter(),
            index: 0,
        })
    }

    /// Convert the next positional argument.
    pub fn arg<T: FromValue>(&mut self) -> Result<T, InvokeError> {
        let index = self.index;
        self.index += 1;
        let value = self.values.next().unwrap_or(Value::Null);
        T::from_value(value).map_err(|source| InvokeError::Argument {
            index,
            source: Box::new(source),
        })
    }
}

/// Fields of an incoming object, consumed one by one by generated struct conversions.
#[derive(Debug)]
pub struct ObjectFields {
    fields: Vec<(String, Value)>,
}

impl ObjectFields {
    /// Start reading an object value. Fails for any other kind.
    pub fn new(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(InvokeError::mismatch("object", &other)),
        }
    }

    /// Take and convert a field. A missing field reads as `null`.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T, InvokeError> {
        let value = match self.fields.iter().position(|(key, _)| key == name) {
            Some(position) => self.fields.swap_remove(position).1,
            None => Value::Null,
        };
        T::from_value(value).map_err(|source| InvokeError::Field {
            field: name.to_string(),
            source: Box::new(source),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_rejects_lossy_numbers() {
        assert_eq!(i32::from_value(Value::Number(42.0)).unwrap(), 42);
        assert_eq!(i32::from_value(Value::Number(-2_147_483_648.0)).unwrap(), i32::MIN);
        assert_eq!(
            i32::from_value(Value::Number(1.5)),
            Err(InvokeError::Overflow(1.5))
        );
        assert_eq!(
            i32::from_value(Value::Number(3_000_000_000.0)),
            Err(InvokeError::Overflow(3_000_000_000.0))
        );
    }

    #[test]
    fn test_option_distinguishes_null_from_values() {
        assert_eq!(Option::<f64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<f64>::from_value(Value::Number(0.0)).unwrap(), Some(0.0));
        assert_eq!(Option::<String>::from_value(Value::String(String::new())).unwrap(), Some(String::new()));
        assert_eq!(None::<f64>.into_value(), Value::Null);
        assert!(f64::from_value(Value::Null).is_err());
    }

    #[test]
    fn test_vec_marshals_elementwise() {
        let value = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(Vec::<i32>::from_value(value).unwrap(), vec![1, 2]);

        let err = Vec::<i32>::from_value(Value::Array(vec![Value::Bool(true)])).unwrap_err();
        assert!(matches!(err, InvokeError::TypeMismatch { expected: "number", actual: "boolean" }));
    }

    #[test]
    fn test_args_checks_arity_and_tags_index() {
        let err = Args::new("foo", vec![Value::Null], 2).unwrap_err();
        assert_eq!(err.to_string(), "foo expects 2 argument(s), got 1");

        let mut args = Args::new("foo", vec![Value::Bool(true), Value::Null], 2).unwrap();
        assert!(args.arg::<bool>().unwrap());
        let err = args.arg::<String>().unwrap_err();
        assert_eq!(err.to_string(), "argument 1: expected string, got null");
    }

    #[test]
    fn test_object_fields_missing_reads_as_null() {
        let mut fields = ObjectFields::new(Value::Object(vec![(
            "foo".to_string(),
            Value::String("x".to_string()),
        )]))
        .unwrap();
        assert_eq!(fields.take::<String>("foo").unwrap(), "x");
        assert_eq!(fields.take::<Option<f64>>("bar").unwrap(), None);
        let err = fields.take::<bool>("baz").unwrap_err();
        assert_eq!(err.to_string(), "field `baz`: expected boolean, got null");
    }
}
