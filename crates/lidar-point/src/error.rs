use crate::header::PointFormat;
use crate::point::InvalidMembers;
use crate::transform::Axis;
use crate::value::Value;

/// An error type for the point record module.
#[derive(thiserror::Error, Debug)]
pub enum PointError {
    /// A setter received a value outside of the field domain.
    #[error("Value {value} for {field} is out of range [{min}, {max}]")]
    ValueOutOfRange {
        /// Name of the field being set.
        field: &'static str,
        /// The rejected value as given by the caller.
        value: Value,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },

    /// The scaled coordinate does not fit into a 32-bit raw integer.
    #[error("Coordinate {value} on axis {axis} does not fit into a 32-bit raw value")]
    CoordinateOverflow {
        /// Axis of the coordinate.
        axis: Axis,
        /// The real-world coordinate that failed to quantize.
        value: f64,
    },

    /// The dimension is not declared by the header schema.
    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    /// The attribute buffer is shorter than the resolved field.
    #[error("Attribute buffer too small: {required} bytes required, got {actual}")]
    BufferTooSmall {
        /// Number of bytes needed.
        required: usize,
        /// Number of bytes available.
        actual: usize,
    },

    /// The attribute buffer length does not match the header record width.
    #[error("Attribute buffer size ({actual}) does not match the header extra byte size ({expected})")]
    BufferSizeMismatch {
        /// Size declared by the header.
        expected: usize,
        /// Size supplied by the caller.
        actual: usize,
    },

    /// Indexed coordinate access with an index other than 0, 1 or 2.
    #[error("Coordinate index {0} out of range")]
    IndexOutOfRange(usize),

    /// Scale factor is zero or not finite.
    #[error("Invalid scale factor {scale} on axis {axis}")]
    InvalidScale {
        /// Axis of the scale factor.
        axis: Axis,
        /// The rejected scale factor.
        scale: f64,
    },

    /// Offset is not finite.
    #[error("Invalid offset {offset} on axis {axis}")]
    InvalidOffset {
        /// Axis of the offset.
        axis: Axis,
        /// The rejected offset.
        offset: f64,
    },

    /// Point data format id not in 0..=3.
    #[error("Unsupported point data format: {0}")]
    UnsupportedPointFormat(u8),

    /// The optional field is absent for the active point format.
    #[error("Field {field} is not available in point format {format}")]
    FieldNotInFormat {
        /// Name of the requested field.
        field: &'static str,
        /// Active point format.
        format: PointFormat,
    },

    /// Two dimensions share the same name.
    #[error("Duplicate dimension: {0}")]
    DuplicateDimension(String),

    /// An explicit dimension offset puts the dimension past the largest attribute buffer.
    #[error("Dimension {name} at byte offset {offset} ends past the {max} byte attribute buffer limit")]
    InvalidDimensionOffset {
        /// Name of the dimension.
        name: String,
        /// The rejected byte offset.
        offset: usize,
        /// Largest attribute buffer size in bytes.
        max: usize,
    },

    /// Base record plus attribute buffer exceed what a record length can express.
    #[error("Point record length {length} exceeds {max} bytes")]
    RecordTooLong {
        /// Total record length in bytes.
        length: usize,
        /// Largest record length in bytes.
        max: usize,
    },

    /// One or more point members hold out-of-range data.
    #[error("Point data members out of range: {0}")]
    InvalidPointData(InvalidMembers),

    /// Failed to build the serialization tree.
    #[error("Failed to serialize point")]
    Serialization(#[from] serde_json::Error),
}

impl PointError {
    pub(crate) fn out_of_range(
        field: &'static str,
        value: impl Into<Value>,
        min: i64,
        max: i64,
    ) -> Self {
        PointError::ValueOutOfRange {
            field,
            value: value.into(),
            min,
            max,
        }
    }
}
