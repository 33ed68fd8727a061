use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PointError;
use crate::schema::Schema;
use crate::transform::Axis;
use crate::value::ValueType;

/// Default scale factor of every axis.
pub const DEFAULT_SCALE: f64 = 0.01;

/// Largest point record length, in bytes.
pub const MAX_RECORD_LENGTH: usize = u16::MAX as usize;

/// Legacy point data record format.
///
/// The format decides which optional fields a record carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PointFormat {
    /// Base record, 20 bytes.
    #[default]
    Format0,
    /// Base record with GPS time, 28 bytes.
    Format1,
    /// Base record with RGB color, 26 bytes.
    Format2,
    /// Base record with GPS time and RGB color, 34 bytes.
    Format3,
}

impl PointFormat {
    /// Numeric id of the format.
    pub fn id(&self) -> u8 {
        match self {
            PointFormat::Format0 => 0,
            PointFormat::Format1 => 1,
            PointFormat::Format2 => 2,
            PointFormat::Format3 => 3,
        }
    }

    /// Whether records carry a GPS time.
    pub fn has_time(&self) -> bool {
        matches!(self, PointFormat::Format1 | PointFormat::Format3)
    }

    /// Whether records carry an RGB color.
    pub fn has_color(&self) -> bool {
        matches!(self, PointFormat::Format2 | PointFormat::Format3)
    }

    /// Size in bytes of the fixed part of a record.
    pub fn base_byte_size(&self) -> usize {
        let mut size = 20;
        if self.has_time() {
            size += 8;
        }
        if self.has_color() {
            size += 6;
        }
        size
    }
}

impl TryFrom<u8> for PointFormat {
    type Error = PointError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(PointFormat::Format0),
            1 => Ok(PointFormat::Format1),
            2 => Ok(PointFormat::Format2),
            3 => Ok(PointFormat::Format3),
            _ => Err(PointError::UnsupportedPointFormat(id)),
        }
    }
}

impl From<PointFormat> for u8 {
    fn from(format: PointFormat) -> Self {
        format.id()
    }
}

impl fmt::Display for PointFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Header of a point set.
///
/// Holds the scale and offset of each axis, the point format and the schema of
/// the extra dimensions. A header is read-only once points reference it; points
/// share it through an `Arc`.
///
/// # Examples
///
/// ```
/// use lidar_point::{Header, PointFormat, Schema};
///
/// let header = Header::new(
///     PointFormat::Format1,
///     [0.001, 0.001, 0.01],
///     [500_000.0, 4_000_000.0, 0.0],
///     Schema::new(),
/// ).unwrap();
///
/// assert_eq!(header.data_record_length(), 28);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HeaderConfig", into = "HeaderConfig")]
pub struct Header {
    format: PointFormat,
    scale: [f64; 3],
    offset: [f64; 3],
    schema: Schema,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            format: PointFormat::default(),
            scale: [DEFAULT_SCALE; 3],
            offset: [0.0; 3],
            schema: Schema::default(),
        }
    }
}

impl Header {
    /// Create a new header.
    ///
    /// # Arguments
    ///
    /// * `format` - The point data record format.
    /// * `scale` - The scale factor of the X, Y and Z axes.
    /// * `offset` - The offset of the X, Y and Z axes.
    /// * `schema` - The extra dimensions stored in each point attribute buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::InvalidScale`] if a scale factor is zero or not finite,
    /// [`PointError::InvalidOffset`] if an offset is not finite and
    /// [`PointError::RecordTooLong`] if the record length does not fit into 16 bits.
    pub fn new(
        format: PointFormat,
        scale: [f64; 3],
        offset: [f64; 3],
        schema: Schema,
    ) -> Result<Self, PointError> {
        for axis in Axis::ALL {
            let s = scale[axis.index()];
            if s == 0.0 || !s.is_finite() {
                return Err(PointError::InvalidScale { axis, scale: s });
            }
            let o = offset[axis.index()];
            if !o.is_finite() {
                return Err(PointError::InvalidOffset { axis, offset: o });
            }
        }

        let length = format.base_byte_size() + schema.byte_size();
        if length > MAX_RECORD_LENGTH {
            return Err(PointError::RecordTooLong {
                length,
                max: MAX_RECORD_LENGTH,
            });
        }

        log::debug!(
            "header: format {format}, scale {scale:?}, offset {offset:?}, {} extra dimension(s)",
            schema.len()
        );

        Ok(Self {
            format,
            scale,
            offset,
            schema,
        })
    }

    /// The point data record format.
    pub fn point_format(&self) -> PointFormat {
        self.format
    }

    /// Scale factor of an axis.
    #[inline]
    pub fn scale(&self, axis: Axis) -> f64 {
        self.scale[axis.index()]
    }

    /// Offset of an axis.
    #[inline]
    pub fn offset(&self, axis: Axis) -> f64 {
        self.offset[axis.index()]
    }

    /// Scale factors of the X, Y and Z axes.
    pub fn scales(&self) -> [f64; 3] {
        self.scale
    }

    /// Offsets of the X, Y and Z axes.
    pub fn offsets(&self) -> [f64; 3] {
        self.offset
    }

    /// The schema of the extra dimensions.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Size in bytes of the attribute buffer of every point.
    pub fn extra_byte_size(&self) -> usize {
        self.schema.byte_size()
    }

    /// Size in bytes of a whole point record.
    pub fn data_record_length(&self) -> usize {
        self.format.base_byte_size() + self.extra_byte_size()
    }
}

/// Dimension entry of a [`HeaderConfig`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionConfig {
    /// Name of the dimension.
    pub name: String,
    /// Primitive type of the dimension.
    pub value_type: ValueType,
    /// Explicit byte offset, packed after the previous dimension when missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// Serializable description of a [`Header`].
///
/// # Examples
///
/// ```
/// use lidar_point::{Header, HeaderConfig};
///
/// let config: HeaderConfig = serde_json::from_str(r#"{
///     "point_format": 3,
///     "scale": [0.01, 0.01, 0.01],
///     "offset": [0.0, 0.0, 0.0],
///     "dimensions": [{ "name": "Amplitude", "value_type": "f32" }]
/// }"#).unwrap();
///
/// let header = Header::try_from(config).unwrap();
/// assert_eq!(header.extra_byte_size(), 4);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Point data record format id.
    #[serde(default)]
    pub point_format: u8,
    /// Scale factor of the X, Y and Z axes.
    #[serde(default = "default_scale")]
    pub scale: [f64; 3],
    /// Offset of the X, Y and Z axes.
    #[serde(default)]
    pub offset: [f64; 3],
    /// Extra dimensions in buffer order.
    #[serde(default)]
    pub dimensions: Vec<DimensionConfig>,
}

fn default_scale() -> [f64; 3] {
    [DEFAULT_SCALE; 3]
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            point_format: 0,
            scale: default_scale(),
            offset: [0.0; 3],
            dimensions: Vec::new(),
        }
    }
}

impl TryFrom<HeaderConfig> for Header {
    type Error = PointError;

    fn try_from(config: HeaderConfig) -> Result<Self, Self::Error> {
        let format = PointFormat::try_from(config.point_format)?;
        let schema = Schema::try_from(config.dimensions)?;
        Header::new(format, config.scale, config.offset, schema)
    }
}

impl From<Header> for HeaderConfig {
    fn from(header: Header) -> Self {
        Self {
            point_format: header.format.id(),
            scale: header.scale,
            offset: header.offset,
            dimensions: header.schema.into(),
        }
    }
}
