use std::fmt;

use num_traits::{NumCast, ToPrimitive};
use serde::{Deserialize, Serialize};

/// On-disk primitive type of a dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 64-bit integer.
    U64,
    /// IEEE-754 single precision float.
    F32,
    /// IEEE-754 double precision float.
    F64,
}

impl ValueType {
    /// Size of the type in bytes.
    pub fn size(&self) -> usize {
        match self {
            ValueType::I8 | ValueType::U8 => 1,
            ValueType::I16 | ValueType::U16 => 2,
            ValueType::I32 | ValueType::U32 | ValueType::F32 => 4,
            ValueType::I64 | ValueType::U64 | ValueType::F64 => 8,
        }
    }

    /// Whether the type is a floating point type.
    pub fn is_float(&self) -> bool {
        matches!(self, ValueType::F32 | ValueType::F64)
    }

    /// Whether the type is a signed integer or float.
    pub fn is_signed(&self) -> bool {
        !matches!(
            self,
            ValueType::U8 | ValueType::U16 | ValueType::U32 | ValueType::U64
        )
    }
}

/// A dimension value tagged with its primitive type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Signed 8-bit integer.
    I8(i8),
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Signed 16-bit integer.
    I16(i16),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Signed 32-bit integer.
    I32(i32),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Single precision float.
    F32(f32),
    /// Double precision float.
    F64(f64),
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive!(
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

impl Value {
    /// The primitive type of the value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::I8(_) => ValueType::I8,
            Value::U8(_) => ValueType::U8,
            Value::I16(_) => ValueType::I16,
            Value::U16(_) => ValueType::U16,
            Value::I32(_) => ValueType::I32,
            Value::U32(_) => ValueType::U32,
            Value::I64(_) => ValueType::I64,
            Value::U64(_) => ValueType::U64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }

    /// Convert the value to any primitive number.
    ///
    /// Returns `None` if the value is not representable in `T`, e.g. a negative
    /// value cast to an unsigned type or a float with a fractional part cast
    /// to an integer.
    pub fn cast<T: NumCast>(&self) -> Option<T> {
        match *self {
            Value::I8(v) => T::from(v),
            Value::U8(v) => T::from(v),
            Value::I16(v) => T::from(v),
            Value::U16(v) => T::from(v),
            Value::I32(v) => T::from(v),
            Value::U32(v) => T::from(v),
            Value::I64(v) => T::from(v),
            Value::U64(v) => T::from(v),
            Value::F32(v) => Self::cast_float(v),
            Value::F64(v) => Self::cast_float(v),
        }
    }

    /// Lossy conversion to a double.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::I8(v) => v as f64,
            Value::U8(v) => v as f64,
            Value::I16(v) => v as f64,
            Value::U16(v) => v as f64,
            Value::I32(v) => v as f64,
            Value::U32(v) => v as f64,
            Value::I64(v) => v as f64,
            Value::U64(v) => v as f64,
            Value::F32(v) => v as f64,
            Value::F64(v) => v,
        }
    }

    /// Convert the value to another primitive type, `None` when out of range.
    pub fn convert(&self, value_type: ValueType) -> Option<Value> {
        let value = match value_type {
            ValueType::I8 => Value::I8(self.cast()?),
            ValueType::U8 => Value::U8(self.cast()?),
            ValueType::I16 => Value::I16(self.cast()?),
            ValueType::U16 => Value::U16(self.cast()?),
            ValueType::I32 => Value::I32(self.cast()?),
            ValueType::U32 => Value::U32(self.cast()?),
            ValueType::I64 => Value::I64(self.cast()?),
            ValueType::U64 => Value::U64(self.cast()?),
            ValueType::F32 => Value::F32(self.cast()?),
            ValueType::F64 => Value::F64(self.cast()?),
        };
        Some(value)
    }

    // integers only accept whole floats, num-traits would truncate
    fn cast_float<F, T>(v: F) -> Option<T>
    where
        F: num_traits::Float + ToPrimitive,
        T: NumCast,
    {
        let target_is_float = T::from(0.5f32)
            .and_then(|half: T| half.to_f64())
            .is_some_and(|half| half == 0.5);
        if !target_is_float && v.fract() != F::zero() {
            return None;
        }
        T::from(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I8(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
        }
    }
}
