use std::cmp::Ordering;
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// Wire format of a characteristic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    String,
    Bool,
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Float,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::String => "string",
            Format::Bool => "bool",
            Format::UInt8 => "uint8",
            Format::Int8 => "int8",
            Format::UInt16 => "uint16",
            Format::Int16 => "int16",
            Format::UInt32 => "uint32",
            Format::Int32 => "int32",
            Format::UInt64 => "uint64",
            Format::Float => "float",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Format::String | Format::Bool)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for format names we know about but do not model (`data`, `tlv8`)
/// as well as for garbage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s {
            "string" => Format::String,
            "bool" => Format::Bool,
            "uint8" => Format::UInt8,
            "int8" => Format::Int8,
            "uint16" => Format::UInt16,
            "int16" => Format::Int16,
            "uint32" => Format::UInt32,
            "int32" => Format::Int32,
            "uint64" => Format::UInt64,
            "float" => Format::Float,
            other => return Err(UnknownFormat(other.to_string())),
        };
        Ok(format)
    }
}

/// A characteristic value. The variant always matches the characteristic's
/// [`Format`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Bool(bool),
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Float(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i128),
    Float(f64),
}

impl Value {
    pub fn format(&self) -> Format {
        match self {
            Value::String(_) => Format::String,
            Value::Bool(_) => Format::Bool,
            Value::UInt8(_) => Format::UInt8,
            Value::Int8(_) => Format::Int8,
            Value::UInt16(_) => Format::UInt16,
            Value::Int16(_) => Format::Int16,
            Value::UInt32(_) => Format::UInt32,
            Value::Int32(_) => Format::Int32,
            Value::UInt64(_) => Format::UInt64,
            Value::Float(_) => Format::Float,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.number()? {
            Number::Int(i) => Some(i as f64),
            Number::Float(f) => Some(f),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn number(&self) -> Option<Number> {
        let n = match self {
            Value::UInt8(v) => Number::Int(i128::from(*v)),
            Value::Int8(v) => Number::Int(i128::from(*v)),
            Value::UInt16(v) => Number::Int(i128::from(*v)),
            Value::Int16(v) => Number::Int(i128::from(*v)),
            Value::UInt32(v) => Number::Int(i128::from(*v)),
            Value::Int32(v) => Number::Int(i128::from(*v)),
            Value::UInt64(v) => Number::Int(i128::from(*v)),
            Value::Float(v) => Number::Float(*v),
            Value::String(_) | Value::Bool(_) => return None,
        };
        Some(n)
    }

    /// Orders two numeric values of the same format.
    pub(crate) fn numeric_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self.number()?, other.number()?) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }

    /// True when `self` is at least one `step` away from `current`.
    pub(crate) fn clears_step(&self, current: &Value, step: &Value) -> bool {
        match (self.number(), current.number(), step.number()) {
            (Some(Number::Int(new)), Some(Number::Int(cur)), Some(Number::Int(step))) => {
                (new - cur).abs() >= step
            }
            (Some(Number::Float(new)), Some(Number::Float(cur)), Some(Number::Float(step))) => {
                // tolerate rounding in decimal steps such as 0.1
                (new - cur).abs() >= step - step.abs() * 1e-9
            }
            _ => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    String => String,
    bool => Bool,
    u8 => UInt8,
    i8 => Int8,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    u64 => UInt64,
    f64 => Float,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// Permission bitmask of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Perms(u8);

impl Perms {
    pub const READ: Perms = Perms(0x01);
    pub const WRITE: Perms = Perms(0x02);
    pub const EVENTS: Perms = Perms(0x04);

    pub const ALL: Perms = Perms(0x07);
    /// Readable with change notifications.
    pub const READ_EVENTS: Perms = Perms(0x05);
    pub const READ_ONLY: Perms = Perms(0x01);
    pub const WRITE_ONLY: Perms = Perms(0x02);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Perms) -> bool {
        self.0 & other.0 == other.0
    }

    /// Wire tokens in `pr`, `pw`, `ev` order.
    pub fn tokens(self) -> Vec<&'static str> {
        [(Perms::READ, "pr"), (Perms::WRITE, "pw"), (Perms::EVENTS, "ev")]
            .into_iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, token)| token)
            .collect()
    }
}

impl BitOr for Perms {
    type Output = Perms;

    fn bitor(self, rhs: Perms) -> Perms {
        Perms(self.0 | rhs.0)
    }
}

impl Serialize for Perms {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tokens = self.tokens();
        let mut seq = serializer.serialize_seq(Some(tokens.len()))?;
        for token in tokens {
            seq.serialize_element(token)?;
        }
        seq.end()
    }
}

/// Unit tag attached to numeric characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Percentage,
    ArcDegrees,
    Celsius,
    Lux,
    Seconds,
}
