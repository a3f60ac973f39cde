use crate::{Error, Result};
use std::fmt;

/// A value that can be bound to a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Blob(Vec<u8>),

    /// A database-native array, see [ArrayValue].
    Array(ArrayValue),
}

impl Value {
    /// The name of the variant, used to report type mismatches.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int8(_) => "Int8",
            Value::Int16(_) => "Int16",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::UInt8(_) => "UInt8",
            Value::UInt16(_) => "UInt16",
            Value::UInt32(_) => "UInt32",
            Value::UInt64(_) => "UInt64",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::String(_) => "String",
            Value::Blob(_) => "Blob",
            Value::Array(_) => "Array",
        }
    }
}

/// The type of the elements of an [ArrayValue].
///
/// Drivers are responsible for resolving the type name given by the user into one of these types, a type name that
/// cannot be resolved is not recognized by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayElementType {
    Integer,
    Real,
    Text,
    Blob,
    Boolean,
}

impl ArrayElementType {
    /// Check if a value can be stored in an array of this type.
    ///
    /// `NULL` is accepted by all types, integers are accepted by `Real` arrays.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ArrayElementType::Boolean, Value::Bool(_)) => true,
            (
                ArrayElementType::Integer | ArrayElementType::Real,
                Value::Int8(_)
                | Value::Int16(_)
                | Value::Int32(_)
                | Value::Int64(_)
                | Value::UInt8(_)
                | Value::UInt16(_)
                | Value::UInt32(_)
                | Value::UInt64(_),
            ) => true,
            (ArrayElementType::Real, Value::Float32(_) | Value::Float64(_)) => true,
            (ArrayElementType::Text, Value::String(_)) => true,
            (ArrayElementType::Blob, Value::Blob(_)) => true,
            _ => false,
        }
    }
}

/// A homogeneous collection of values of a database type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    type_name: String,
    element_type: ArrayElementType,
    elements: Vec<Value>,
}

impl ArrayValue {
    /// Create a new array.
    ///
    /// Returns an error if one of the elements cannot be stored as `element_type`.
    pub fn try_new(type_name: &str, element_type: ArrayElementType, elements: Vec<Value>) -> Result<Self> {
        if let Some(element) = elements.iter().find(|element| !element_type.accepts(element)) {
            return Err(Error::InvalidType {
                expected: type_name.to_string(),
                actual: element.type_name().to_string(),
            });
        }
        Ok(ArrayValue { type_name: type_name.to_string(), element_type, elements })
    }

    /// The type name used to create the array.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn element_type(&self) -> ArrayElementType {
        self.element_type
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Convert an Option<T> into a Value::Null if None, otherwise convert the value into a Value.
impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    #[inline]
    fn from(v: Option<T>) -> Value {
        match v {
            Some(x) => x.into(),
            None => Value::Null,
        }
    }
}

macro_rules! impl_from_for_value {
    ($t:ty, $variant:ident) => {
        impl From<$t> for Value {
            #[inline]
            fn from(value: $t) -> Self {
                Value::$variant(value.into())
            }
        }
    };
}

impl_from_for_value!(i8, Int8);
impl_from_for_value!(i16, Int16);
impl_from_for_value!(i32, Int32);
impl_from_for_value!(i64, Int64);
impl_from_for_value!(u8, UInt8);
impl_from_for_value!(u16, UInt16);
impl_from_for_value!(u32, UInt32);
impl_from_for_value!(u64, UInt64);
impl_from_for_value!(bool, Bool);
impl_from_for_value!(f32, Float32);
impl_from_for_value!(f64, Float64);
impl_from_for_value!(String, String);
impl_from_for_value!(&str, String);
impl_from_for_value!(Vec<u8>, Blob);
impl_from_for_value!(ArrayValue, Array);

/// Display implementation for Value.
///
/// Values are rendered as SQL literals. This is the form used when a statement is rendered with its bound values.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            Value::Int8(value) => write!(f, "{}", value),
            Value::Int16(value) => write!(f, "{}", value),
            Value::Int32(value) => write!(f, "{}", value),
            Value::Int64(value) => write!(f, "{}", value),
            Value::UInt8(value) => write!(f, "{}", value),
            Value::UInt16(value) => write!(f, "{}", value),
            Value::UInt32(value) => write!(f, "{}", value),
            Value::UInt64(value) => write!(f, "{}", value),
            Value::Float32(value) => write!(f, "{}", value),
            Value::Float64(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "'{}'", value.replace('\'', "''")),
            Value::Blob(value) => {
                write!(f, "X'")?;
                for byte in value {
                    write!(f, "{:02X}", byte)?;
                }
                write!(f, "'")
            }
            Value::Array(array) => {
                write!(f, "ARRAY[")?;
                for (index, element) in array.elements().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    element.fmt(f)?;
                }
                write!(f, "]")
            }
        }
    }
}
