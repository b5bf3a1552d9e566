//! JSON primitive types used for `type` dispatch and error reporting.
use serde_json::Value;
use std::{convert::TryFrom, fmt, ops::BitOrAssign};

/// One of the seven JSON Schema primitive types.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl PrimitiveType {
    const ALL: [PrimitiveType; 7] = [
        PrimitiveType::Array,
        PrimitiveType::Boolean,
        PrimitiveType::Integer,
        PrimitiveType::Null,
        PrimitiveType::Number,
        PrimitiveType::Object,
        PrimitiveType::String,
    ];

    const fn bit(self) -> u8 {
        match self {
            PrimitiveType::Array => 1,
            PrimitiveType::Boolean => 1 << 1,
            PrimitiveType::Integer => 1 << 2,
            PrimitiveType::Null => 1 << 3,
            PrimitiveType::Number => 1 << 4,
            PrimitiveType::Object => 1 << 5,
            PrimitiveType::String => 1 << 6,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Array => f.write_str("array"),
            PrimitiveType::Boolean => f.write_str("boolean"),
            PrimitiveType::Integer => f.write_str("integer"),
            PrimitiveType::Null => f.write_str("null"),
            PrimitiveType::Number => f.write_str("number"),
            PrimitiveType::Object => f.write_str("object"),
            PrimitiveType::String => f.write_str("string"),
        }
    }
}

impl TryFrom<&str> for PrimitiveType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "array" => Ok(PrimitiveType::Array),
            "boolean" => Ok(PrimitiveType::Boolean),
            "integer" => Ok(PrimitiveType::Integer),
            "null" => Ok(PrimitiveType::Null),
            "number" => Ok(PrimitiveType::Number),
            "object" => Ok(PrimitiveType::Object),
            "string" => Ok(PrimitiveType::String),
            _ => Err(()),
        }
    }
}

impl From<&Value> for PrimitiveType {
    fn from(instance: &Value) -> Self {
        match instance {
            Value::Null => PrimitiveType::Null,
            Value::Bool(_) => PrimitiveType::Boolean,
            Value::Number(_) => PrimitiveType::Number,
            Value::String(_) => PrimitiveType::String,
            Value::Array(_) => PrimitiveType::Array,
            Value::Object(_) => PrimitiveType::Object,
        }
    }
}

/// A set of primitive types packed into one byte.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PrimitiveTypesBitMap {
    mask: u8,
}

impl PrimitiveTypesBitMap {
    pub(crate) const fn new() -> Self {
        Self { mask: 0 }
    }

    #[inline]
    pub(crate) const fn with_type(mut self, primitive_type: PrimitiveType) -> Self {
        self.mask |= primitive_type.bit();
        self
    }

    /// Whether the set contains the given type.
    #[must_use]
    pub const fn contains(self, primitive_type: PrimitiveType) -> bool {
        self.mask & primitive_type.bit() != 0
    }

    /// Whether the given instance matches any type in the set. Integers
    /// satisfy `number`, and integral numbers satisfy `integer`.
    pub(crate) fn matches(self, instance: &Value) -> bool {
        match instance {
            Value::Number(number) => {
                self.contains(PrimitiveType::Number)
                    || (self.contains(PrimitiveType::Integer)
                        && crate::validators::helpers::is_integer(number))
            }
            _ => self.contains(PrimitiveType::from(instance)),
        }
    }

    /// Iterate over the contained types in display order.
    pub fn iter(self) -> impl Iterator<Item = PrimitiveType> {
        PrimitiveType::ALL
            .into_iter()
            .filter(move |primitive_type| self.contains(*primitive_type))
    }
}

impl BitOrAssign<PrimitiveType> for PrimitiveTypesBitMap {
    #[inline]
    fn bitor_assign(&mut self, rhs: PrimitiveType) {
        *self = self.with_type(rhs);
    }
}

impl From<PrimitiveType> for PrimitiveTypesBitMap {
    fn from(primitive_type: PrimitiveType) -> Self {
        Self::new().with_type(primitive_type)
    }
}

impl fmt::Display for PrimitiveTypesBitMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for primitive_type in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "\"{primitive_type}\"")?;
            first = false;
        }
        Ok(())
    }
}
