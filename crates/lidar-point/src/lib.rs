#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Sub-byte fields packed into the scan flags byte.
pub mod bitfield;

/// Classification byte: class code and flags.
pub mod classification;

/// Error types for the point module.
pub mod error;

/// Well-known names of the fixed point members.
pub mod fields;

/// Header: scale, offset, point format and schema.
pub mod header;

/// The point record.
pub mod point;

/// Schema of the extra dimensions and their buffer codec.
pub mod schema;

/// Raw to scaled coordinate transform.
pub mod transform;

/// Tagged values of typed dimensions.
pub mod value;

pub use crate::bitfield::{BitField, ScanFlags};
pub use crate::classification::{ClassKind, Classification};
pub use crate::error::PointError;
pub use crate::fields::FixedField;
pub use crate::header::{DimensionConfig, Header, HeaderConfig, PointFormat};
pub use crate::point::{Color, InvalidMembers, Point, RawPoint};
pub use crate::schema::{Dimension, DimensionId, DimensionRef, Schema};
pub use crate::transform::Axis;
pub use crate::value::{Value, ValueType};
