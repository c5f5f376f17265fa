//! Typed attribute values carried by tree elements.

use std::fmt;

/// Attribute type tag, one per wire encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Bool,
    Char,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Raw,
    BoolArray,
    Int32Array,
    Int64Array,
    FloatArray,
    DoubleArray,
}

impl AttributeType {
    /// Returns true for the homogeneous array encodings.
    #[inline]
    pub const fn is_array(self) -> bool {
        matches!(
            self,
            Self::BoolArray | Self::Int32Array | Self::Int64Array | Self::FloatArray | Self::DoubleArray
        )
    }
}

/// A typed scalar or homogeneous array value attached to an element.
#[derive(Clone, PartialEq)]
pub enum Attribute {
    Bool(bool),
    /// Single byte, used for character codes such as model shading.
    Char(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    Raw(Vec<u8>),
    BoolArray(Vec<bool>),
    Int32Array(Vec<i32>),
    Int64Array(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
}

impl Attribute {
    /// Get the type tag.
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Self::Bool(_) => AttributeType::Bool,
            Self::Char(_) => AttributeType::Char,
            Self::Int16(_) => AttributeType::Int16,
            Self::Int32(_) => AttributeType::Int32,
            Self::Int64(_) => AttributeType::Int64,
            Self::Float(_) => AttributeType::Float,
            Self::Double(_) => AttributeType::Double,
            Self::String(_) => AttributeType::String,
            Self::Raw(_) => AttributeType::Raw,
            Self::BoolArray(_) => AttributeType::BoolArray,
            Self::Int32Array(_) => AttributeType::Int32Array,
            Self::Int64Array(_) => AttributeType::Int64Array,
            Self::FloatArray(_) => AttributeType::FloatArray,
            Self::DoubleArray(_) => AttributeType::DoubleArray,
        }
    }

    /// Any integral scalar (including bool and char) widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Bool(v) => Some(v as i64),
            Self::Char(v) => Some(v as i64),
            Self::Int16(v) => Some(v as i64),
            Self::Int32(v) => Some(v as i64),
            Self::Int64(v) => Some(v),
            _ => None,
        }
    }

    /// Any integral scalar narrowed to i32, if it fits.
    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64().and_then(|v| i32::try_from(v).ok())
    }

    /// Any numeric scalar as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(v) => Some(v as f64),
            Self::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Truthiness of a numeric scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => self.as_i64().map(|v| v != 0),
        }
    }

    /// String payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow a double array.
    pub fn as_f64_slice(&self) -> Option<&[f64]> {
        match self {
            Self::DoubleArray(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow an i32 array.
    pub fn as_i32_slice(&self) -> Option<&[i32]> {
        match self {
            Self::Int32Array(v) => Some(v),
            _ => None,
        }
    }

    /// Any numeric array converted to doubles.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Self::DoubleArray(v) => Some(v.clone()),
            Self::FloatArray(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Self::Int32Array(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Self::Int64Array(v) => Some(v.iter().map(|&x| x as f64).collect()),
            _ => None,
        }
    }

    /// Any integral array converted to i32. `None` if any value does not fit.
    pub fn to_i32_vec(&self) -> Option<Vec<i32>> {
        match self {
            Self::Int32Array(v) => Some(v.clone()),
            Self::Int64Array(v) => v.iter().map(|&x| i32::try_from(x).ok()).collect(),
            _ => None,
        }
    }

    /// Number of elements for arrays, 1 for scalars.
    pub fn len(&self) -> usize {
        match self {
            Self::Raw(v) => v.len(),
            Self::BoolArray(v) => v.len(),
            Self::Int32Array(v) => v.len(),
            Self::Int64Array(v) => v.len(),
            Self::FloatArray(v) => v.len(),
            Self::DoubleArray(v) => v.len(),
            _ => 1,
        }
    }

    /// True for empty arrays.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Char(v) => write!(f, "Char({:?})", *v as char),
            Self::Int16(v) => write!(f, "Int16({v})"),
            Self::Int32(v) => write!(f, "Int32({v})"),
            Self::Int64(v) => write!(f, "Int64({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Double(v) => write!(f, "Double({v})"),
            Self::String(v) => write!(f, "String({v:?})"),
            // Arrays can be huge, print the shape only.
            other => write!(f, "{:?}[{}]", other.attribute_type(), other.len()),
        }
    }
}

impl From<bool> for Attribute {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Attribute {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Attribute {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Attribute {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Attribute {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Attribute {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<i32>> for Attribute {
    fn from(v: Vec<i32>) -> Self {
        Self::Int32Array(v)
    }
}

impl From<Vec<f64>> for Attribute {
    fn from(v: Vec<f64>) -> Self {
        Self::DoubleArray(v)
    }
}
