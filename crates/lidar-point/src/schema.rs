use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::error::PointError;
use crate::header::DimensionConfig;
use crate::value::{Value, ValueType};

/// Largest attribute buffer, in bytes.
///
/// Record lengths are stored as 16-bit unsigned integers.
pub const MAX_EXTRA_BYTES: usize = u16::MAX as usize;

/// Opaque handle of a dimension, valid for the schema that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DimensionId(usize);

impl DimensionId {
    /// Position of the dimension in schema order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Reference to a dimension, either by its declared name or by handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DimensionRef<'a> {
    /// Lookup by name.
    Name(&'a str),
    /// Lookup by handle.
    Id(DimensionId),
}

impl<'a> From<&'a str> for DimensionRef<'a> {
    fn from(name: &'a str) -> Self {
        DimensionRef::Name(name)
    }
}

impl<'a> From<&'a String> for DimensionRef<'a> {
    fn from(name: &'a String) -> Self {
        DimensionRef::Name(name.as_str())
    }
}

impl From<DimensionId> for DimensionRef<'_> {
    fn from(id: DimensionId) -> Self {
        DimensionRef::Id(id)
    }
}

/// A named attribute stored in the attribute buffer of a point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension {
    name: String,
    byte_offset: usize,
    value_type: ValueType,
}

impl Dimension {
    /// The declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset of the first byte inside the attribute buffer.
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Number of bytes of the value.
    pub fn byte_size(&self) -> usize {
        self.value_type.size()
    }

    /// The primitive type of the value.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// One past the last byte of the value.
    pub fn byte_end(&self) -> usize {
        self.byte_offset.saturating_add(self.byte_size())
    }

    /// Read the value of the dimension from an attribute buffer.
    ///
    /// Bytes are little-endian.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::BufferTooSmall`] if the buffer ends before the dimension does.
    pub fn read(&self, buffer: &[u8]) -> Result<Value, PointError> {
        let bytes = self.slice(buffer)?;
        let value = match self.value_type {
            ValueType::I8 => Value::I8(bytes[0] as i8),
            ValueType::U8 => Value::U8(bytes[0]),
            ValueType::I16 => Value::I16(LittleEndian::read_i16(bytes)),
            ValueType::U16 => Value::U16(LittleEndian::read_u16(bytes)),
            ValueType::I32 => Value::I32(LittleEndian::read_i32(bytes)),
            ValueType::U32 => Value::U32(LittleEndian::read_u32(bytes)),
            ValueType::I64 => Value::I64(LittleEndian::read_i64(bytes)),
            ValueType::U64 => Value::U64(LittleEndian::read_u64(bytes)),
            ValueType::F32 => Value::F32(LittleEndian::read_f32(bytes)),
            ValueType::F64 => Value::F64(LittleEndian::read_f64(bytes)),
        };
        Ok(value)
    }

    /// Write a value of the dimension into an attribute buffer.
    ///
    /// The value is converted to the declared type first.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::BufferTooSmall`] if the buffer ends before the dimension does,
    /// or [`PointError::ValueOutOfRange`] if the value is not representable in the declared type.
    pub fn write(&self, buffer: &mut [u8], value: Value) -> Result<(), PointError> {
        let converted = value
            .convert(self.value_type)
            .ok_or_else(|| self.out_of_range(value))?;
        let bytes = self.slice_mut(buffer)?;
        match converted {
            Value::I8(v) => bytes[0] = v as u8,
            Value::U8(v) => bytes[0] = v,
            Value::I16(v) => LittleEndian::write_i16(bytes, v),
            Value::U16(v) => LittleEndian::write_u16(bytes, v),
            Value::I32(v) => LittleEndian::write_i32(bytes, v),
            Value::U32(v) => LittleEndian::write_u32(bytes, v),
            Value::I64(v) => LittleEndian::write_i64(bytes, v),
            Value::U64(v) => LittleEndian::write_u64(bytes, v),
            Value::F32(v) => LittleEndian::write_f32(bytes, v),
            Value::F64(v) => LittleEndian::write_f64(bytes, v),
        }
        Ok(())
    }

    fn slice<'b>(&self, buffer: &'b [u8]) -> Result<&'b [u8], PointError> {
        buffer
            .get(self.byte_offset..self.byte_end())
            .ok_or(PointError::BufferTooSmall {
                required: self.byte_end(),
                actual: buffer.len(),
            })
    }

    fn slice_mut<'b>(&self, buffer: &'b mut [u8]) -> Result<&'b mut [u8], PointError> {
        let actual = buffer.len();
        let range = self.byte_offset..self.byte_end();
        buffer.get_mut(range).ok_or(PointError::BufferTooSmall {
            required: self.byte_end(),
            actual,
        })
    }

    fn out_of_range(&self, value: Value) -> PointError {
        let (min, max) = match self.value_type {
            ValueType::I8 => (i8::MIN as i64, i8::MAX as i64),
            ValueType::U8 => (0, u8::MAX as i64),
            ValueType::I16 => (i16::MIN as i64, i16::MAX as i64),
            ValueType::U16 => (0, u16::MAX as i64),
            ValueType::I32 => (i32::MIN as i64, i32::MAX as i64),
            ValueType::U32 => (0, u32::MAX as i64),
            ValueType::U64 => (0, i64::MAX),
            ValueType::I64 | ValueType::F32 | ValueType::F64 => (i64::MIN, i64::MAX),
        };
        PointError::out_of_range("Dimension", value, min, max)
    }
}

/// Ordered collection of the dimensions stored in the attribute buffer.
///
/// # Examples
///
/// ```
/// use lidar_point::{Schema, ValueType};
///
/// let mut schema = Schema::new();
/// schema.push("Amplitude", ValueType::F32).unwrap();
/// schema.push("Deviation", ValueType::U16).unwrap();
///
/// assert_eq!(schema.byte_size(), 6);
/// assert_eq!(schema.dimension("Deviation").unwrap().byte_offset(), 4);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DimensionConfig>", into = "Vec<DimensionConfig>")]
pub struct Schema {
    dimensions: Vec<Dimension>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dimension packed right after the current last byte.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::DuplicateDimension`] if the name is already declared.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        value_type: ValueType,
    ) -> Result<DimensionId, PointError> {
        let byte_offset = self.byte_size();
        self.insert_at(name, byte_offset, value_type)
    }

    /// Declare a dimension at an explicit byte offset.
    ///
    /// Gaps between dimensions are allowed, they are part of the buffer but unnamed.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::DuplicateDimension`] if the name is already declared and
    /// [`PointError::InvalidDimensionOffset`] if the dimension would end past
    /// [`MAX_EXTRA_BYTES`].
    pub fn insert_at(
        &mut self,
        name: impl Into<String>,
        byte_offset: usize,
        value_type: ValueType,
    ) -> Result<DimensionId, PointError> {
        let name = name.into();
        if self.id(&name).is_some() {
            return Err(PointError::DuplicateDimension(name));
        }
        match byte_offset.checked_add(value_type.size()) {
            Some(end) if end <= MAX_EXTRA_BYTES => {}
            _ => {
                return Err(PointError::InvalidDimensionOffset {
                    name,
                    offset: byte_offset,
                    max: MAX_EXTRA_BYTES,
                })
            }
        }
        self.dimensions.push(Dimension {
            name,
            byte_offset,
            value_type,
        });
        Ok(DimensionId(self.dimensions.len() - 1))
    }

    /// Number of declared dimensions.
    #[inline]
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// Whether no dimension is declared.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Total number of bytes the attribute buffer needs.
    pub fn byte_size(&self) -> usize {
        self.dimensions
            .iter()
            .map(Dimension::byte_end)
            .max()
            .unwrap_or(0)
    }

    /// Handle of a dimension by name.
    pub fn id(&self, name: &str) -> Option<DimensionId> {
        self.dimensions
            .iter()
            .position(|d| d.name == name)
            .map(DimensionId)
    }

    /// Dimension by name.
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Dimension by handle.
    pub fn get(&self, id: DimensionId) -> Option<&Dimension> {
        self.dimensions.get(id.0)
    }

    /// Resolve a reference to its dimension.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::UnknownDimension`] if the schema does not declare it.
    pub fn resolve(&self, dimension: DimensionRef<'_>) -> Result<&Dimension, PointError> {
        match dimension {
            DimensionRef::Name(name) => self
                .dimension(name)
                .ok_or_else(|| PointError::UnknownDimension(name.to_string())),
            DimensionRef::Id(id) => self
                .get(id)
                .ok_or_else(|| PointError::UnknownDimension(format!("#{}", id.0))),
        }
    }

    /// Iterate over the dimensions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Dimension> {
        self.dimensions.iter()
    }
}

impl TryFrom<Vec<DimensionConfig>> for Schema {
    type Error = PointError;

    fn try_from(dimensions: Vec<DimensionConfig>) -> Result<Self, Self::Error> {
        let mut schema = Schema::new();
        for dimension in dimensions {
            match dimension.offset {
                Some(offset) => schema.insert_at(dimension.name, offset, dimension.value_type)?,
                None => schema.push(dimension.name, dimension.value_type)?,
            };
        }
        Ok(schema)
    }
}

impl From<Schema> for Vec<DimensionConfig> {
    fn from(schema: Schema) -> Self {
        schema
            .dimensions
            .into_iter()
            .map(|d| DimensionConfig {
                name: d.name,
                value_type: d.value_type,
                offset: Some(d.byte_offset),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Dimension;
    type IntoIter = std::slice::Iter<'a, Dimension>;

    fn into_iter(self) -> Self::IntoIter {
        self.dimensions.iter()
    }
}
