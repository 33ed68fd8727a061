use std::fmt;
use std::sync::{Arc, OnceLock};

use num_traits::{Bounded, NumCast, ToPrimitive};
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Serialize};

use crate::bitfield::ScanFlags;
use crate::classification::Classification;
use crate::error::PointError;
use crate::fields::FixedField;
use crate::header::Header;
use crate::schema::{DimensionRef, Schema};
use crate::transform::{self, Axis};
use crate::value::Value;

/// Smallest valid scan angle rank, in degrees.
pub const SCAN_ANGLE_RANK_MIN: i8 = -90;

/// Largest valid scan angle rank, in degrees.
pub const SCAN_ANGLE_RANK_MAX: i8 = 90;

/// RGB color of a point, 16 bits per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Color {
    /// Red channel.
    pub red: u16,
    /// Green channel.
    pub green: u16,
    /// Blue channel.
    pub blue: u16,
}

impl Color {
    /// Create a new color.
    pub const fn new(red: u16, green: u16, blue: u16) -> Self {
        Self { red, green, blue }
    }
}

bitflags::bitflags! {
    /// Bit mask naming the point members that failed validation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct InvalidMembers: u16 {
        /// Scan angle rank outside of [-90, 90].
        const SCAN_ANGLE_RANK = 1 << 5;
        /// GPS time presence disagrees with the point format, or the time is not finite.
        const TIME = 1 << 6;
        /// Color presence disagrees with the point format.
        const COLOR = 1 << 7;
        /// Attribute buffer size differs from the header extra byte size.
        const EXTRA_BYTES = 1 << 8;
    }
}

impl fmt::Display for InvalidMembers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.iter_names().map(|(name, _)| name).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Point record members exactly as stored on disk.
///
/// This is the hand-over type of the I/O layer: no validation happens when a
/// [`Point`] is built from it, call [`Point::validate`] to check the result.
#[derive(Clone, Debug, Default, PartialEq)]
#[allow(missing_docs)]
pub struct RawPoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub intensity: u16,
    pub flags: u8,
    pub classification: u8,
    pub scan_angle_rank: i8,
    pub user_data: u8,
    pub point_source_id: u16,
    pub gps_time: Option<f64>,
    pub color: Option<Color>,
    pub extra_bytes: Vec<u8>,
}

fn default_header() -> Arc<Header> {
    static DEFAULT_HEADER: OnceLock<Arc<Header>> = OnceLock::new();
    DEFAULT_HEADER
        .get_or_init(|| Arc::new(Header::default()))
        .clone()
}

/// A point record: scaled coordinates, scan attributes and extra dimensions.
///
/// The coordinates are stored as raw integers and converted with the scale and
/// offset of the header the point is bound to. Extra dimensions live in an
/// attribute buffer laid out by the header schema.
///
/// Cloning a point deep-copies its attribute buffer and shares its header.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use lidar_point::{Header, Point};
///
/// let header = Arc::new(Header::default());
/// let mut point = Point::new(header);
/// point.set_coordinates(1.5, -2.25, 10.0).unwrap();
///
/// assert_eq!(point.raw_x(), 150);
/// assert_eq!(point.coordinate(2).unwrap(), 10.0);
/// ```
#[derive(Clone, Debug)]
pub struct Point {
    x: i32,
    y: i32,
    z: i32,
    intensity: u16,
    scan_flags: ScanFlags,
    classification: Classification,
    scan_angle_rank: i8,
    user_data: u8,
    point_source_id: u16,
    gps_time: Option<f64>,
    color: Option<Color>,
    data: Vec<u8>,
    header: Arc<Header>,
}

impl Default for Point {
    /// A point bound to the shared default header.
    fn default() -> Self {
        Self::new(default_header())
    }
}

impl Point {
    /// Create a zeroed point bound to a header.
    ///
    /// Optional members are present when the header point format carries them,
    /// and the attribute buffer is sized to the header schema.
    pub fn new(header: Arc<Header>) -> Self {
        let format = header.point_format();
        Self {
            x: 0,
            y: 0,
            z: 0,
            intensity: 0,
            scan_flags: ScanFlags::default(),
            classification: Classification::default(),
            scan_angle_rank: 0,
            user_data: 0,
            point_source_id: 0,
            gps_time: format.has_time().then_some(0.0),
            color: format.has_color().then(Color::default),
            data: vec![0; header.extra_byte_size()],
            header,
        }
    }

    /// Build a point from raw record members without validating them.
    pub fn from_raw(header: Arc<Header>, raw: RawPoint) -> Self {
        Self {
            x: raw.x,
            y: raw.y,
            z: raw.z,
            intensity: raw.intensity,
            scan_flags: ScanFlags::from_bits(raw.flags),
            classification: Classification::from_bits(raw.classification),
            scan_angle_rank: raw.scan_angle_rank,
            user_data: raw.user_data,
            point_source_id: raw.point_source_id,
            gps_time: raw.gps_time,
            color: raw.color,
            data: raw.extra_bytes,
            header,
        }
    }

    /// The raw record members of the point.
    pub fn to_raw(&self) -> RawPoint {
        RawPoint {
            x: self.x,
            y: self.y,
            z: self.z,
            intensity: self.intensity,
            flags: self.scan_flags.bits(),
            classification: self.classification.bits(),
            scan_angle_rank: self.scan_angle_rank,
            user_data: self.user_data,
            point_source_id: self.point_source_id,
            gps_time: self.gps_time,
            color: self.color,
            extra_bytes: self.data.clone(),
        }
    }

    /// The header the point is bound to.
    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    /// Bind the point to another header.
    ///
    /// Real-world coordinates are preserved by re-quantizing them with the new
    /// scale and offset. Optional members follow the new point format, and
    /// extra dimensions are carried over by name, converted to their new type;
    /// dimensions unknown to the old schema start zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::CoordinateOverflow`] if a coordinate does not fit the new
    /// quantization, or [`PointError::ValueOutOfRange`] if a carried dimension value does
    /// not fit its new type. The point is left untouched on error.
    pub fn set_header(&mut self, header: Arc<Header>) -> Result<(), PointError> {
        if Arc::ptr_eq(&self.header, &header) {
            return Ok(());
        }

        let [x, y, z] = quantize(&header, self.coordinates())?;
        let data = remap_extra_bytes(self.header.schema(), &self.data, &header)?;

        log::debug!(
            "rebinding point from format {} to format {}",
            self.header.point_format(),
            header.point_format()
        );

        let format = header.point_format();
        self.x = x;
        self.y = y;
        self.z = z;
        self.gps_time = format.has_time().then(|| self.gps_time.unwrap_or(0.0));
        self.color = format.has_color().then(|| self.color.unwrap_or_default());
        self.data = data;
        self.header = header;
        Ok(())
    }

    fn scaled(&self, axis: Axis, raw: i32) -> f64 {
        transform::to_scaled(raw, self.header.scale(axis), self.header.offset(axis))
    }

    fn raw(&self, axis: Axis, value: f64) -> Result<i32, PointError> {
        transform::to_raw(
            axis,
            value,
            self.header.scale(axis),
            self.header.offset(axis),
        )
    }

    /// Scaled X coordinate.
    #[inline]
    pub fn x(&self) -> f64 {
        self.scaled(Axis::X, self.x)
    }

    /// Scaled Y coordinate.
    #[inline]
    pub fn y(&self) -> f64 {
        self.scaled(Axis::Y, self.y)
    }

    /// Scaled Z coordinate.
    #[inline]
    pub fn z(&self) -> f64 {
        self.scaled(Axis::Z, self.z)
    }

    /// Scaled X, Y and Z coordinates.
    pub fn coordinates(&self) -> [f64; 3] {
        [self.x(), self.y(), self.z()]
    }

    /// Scaled coordinate by index, 0 for X, 1 for Y and 2 for Z.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::IndexOutOfRange`] for any other index.
    pub fn coordinate(&self, index: usize) -> Result<f64, PointError> {
        let axis = Axis::try_from(index)?;
        let raw = [self.x, self.y, self.z][axis.index()];
        Ok(self.scaled(axis, raw))
    }

    /// Raw X coordinate.
    pub fn raw_x(&self) -> i32 {
        self.x
    }

    /// Raw Y coordinate.
    pub fn raw_y(&self) -> i32 {
        self.y
    }

    /// Raw Z coordinate.
    pub fn raw_z(&self) -> i32 {
        self.z
    }

    /// Set the raw X coordinate.
    pub fn set_raw_x(&mut self, value: i32) {
        self.x = value;
    }

    /// Set the raw Y coordinate.
    pub fn set_raw_y(&mut self, value: i32) {
        self.y = value;
    }

    /// Set the raw Z coordinate.
    pub fn set_raw_z(&mut self, value: i32) {
        self.z = value;
    }

    /// Set the scaled X coordinate.
    pub fn set_x(&mut self, value: f64) -> Result<(), PointError> {
        self.x = self.raw(Axis::X, value)?;
        Ok(())
    }

    /// Set the scaled Y coordinate.
    pub fn set_y(&mut self, value: f64) -> Result<(), PointError> {
        self.y = self.raw(Axis::Y, value)?;
        Ok(())
    }

    /// Set the scaled Z coordinate.
    pub fn set_z(&mut self, value: f64) -> Result<(), PointError> {
        self.z = self.raw(Axis::Z, value)?;
        Ok(())
    }

    /// Set the three scaled coordinates at once.
    ///
    /// Either all coordinates are updated or, on overflow, none.
    pub fn set_coordinates(&mut self, x: f64, y: f64, z: f64) -> Result<(), PointError> {
        let [x, y, z] = quantize(&self.header, [x, y, z])?;
        self.x = x;
        self.y = y;
        self.z = z;
        Ok(())
    }

    /// Pulse return magnitude.
    pub fn intensity(&self) -> u16 {
        self.intensity
    }

    /// Set the pulse return magnitude.
    pub fn set_intensity(&mut self, value: u16) {
        self.intensity = value;
    }

    /// All scan flags packed in a single byte.
    ///
    /// Return number in bits 0 to 2, number of returns in bits 3 to 5, scan
    /// direction in bit 6 and edge of flight line in bit 7.
    pub fn scan_flags(&self) -> u8 {
        self.scan_flags.bits()
    }

    /// Set all scan flags from a single byte.
    pub fn set_scan_flags(&mut self, flags: u8) {
        self.scan_flags = ScanFlags::from_bits(flags);
    }

    /// Return number of the pulse.
    pub fn return_number(&self) -> u8 {
        self.scan_flags.return_number()
    }

    /// Set the return number, 0 to 7.
    pub fn set_return_number(&mut self, value: u8) -> Result<(), PointError> {
        self.scan_flags.set_return_number(value)
    }

    /// Number of returns of the pulse.
    pub fn number_of_returns(&self) -> u8 {
        self.scan_flags.number_of_returns()
    }

    /// Set the number of returns, 0 to 7.
    pub fn set_number_of_returns(&mut self, value: u8) -> Result<(), PointError> {
        self.scan_flags.set_number_of_returns(value)
    }

    /// Scan direction flag.
    pub fn scan_direction(&self) -> u8 {
        self.scan_flags.scan_direction()
    }

    /// Set the scan direction flag, 0 or 1.
    pub fn set_scan_direction(&mut self, value: u8) -> Result<(), PointError> {
        self.scan_flags.set_scan_direction(value)
    }

    /// Edge of flight line flag.
    pub fn flight_line_edge(&self) -> u8 {
        self.scan_flags.flight_line_edge()
    }

    /// Set the edge of flight line flag, 0 or 1.
    pub fn set_flight_line_edge(&mut self, value: u8) -> Result<(), PointError> {
        self.scan_flags.set_flight_line_edge(value)
    }

    /// Classification of the point.
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Set the classification from a [`Classification`], a packed byte or an 8-bit set.
    pub fn set_classification(&mut self, classification: impl Into<Classification>) {
        self.classification = classification.into();
    }

    /// Scan angle rank in degrees, -90 to 90.
    pub fn scan_angle_rank(&self) -> i8 {
        self.scan_angle_rank
    }

    /// Set the scan angle rank.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::ValueOutOfRange`] outside of [-90, 90].
    pub fn set_scan_angle_rank(&mut self, value: i8) -> Result<(), PointError> {
        if !(SCAN_ANGLE_RANK_MIN..=SCAN_ANGLE_RANK_MAX).contains(&value) {
            return Err(PointError::out_of_range(
                FixedField::ScanAngleRank.name(),
                value,
                SCAN_ANGLE_RANK_MIN as i64,
                SCAN_ANGLE_RANK_MAX as i64,
            ));
        }
        self.scan_angle_rank = value;
        Ok(())
    }

    /// User data, the file marker of the oldest formats.
    pub fn user_data(&self) -> u8 {
        self.user_data
    }

    /// Set the user data.
    pub fn set_user_data(&mut self, value: u8) {
        self.user_data = value;
    }

    /// Point source id, the user bit field of the oldest formats.
    pub fn point_source_id(&self) -> u16 {
        self.point_source_id
    }

    /// Set the point source id.
    pub fn set_point_source_id(&mut self, value: u16) {
        self.point_source_id = value;
    }

    /// GPS time, `None` when the point format has no time.
    pub fn gps_time(&self) -> Option<f64> {
        self.gps_time
    }

    /// Set the GPS time.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::FieldNotInFormat`] if the point format has no time.
    pub fn set_gps_time(&mut self, time: f64) -> Result<(), PointError> {
        let time_slot = self.require_time()?;
        *time_slot = Some(time);
        Ok(())
    }

    /// RGB color, `None` when the point format has no color.
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Set the RGB color.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::FieldNotInFormat`] if the point format has no color.
    pub fn set_color(&mut self, color: Color) -> Result<(), PointError> {
        *self.require_color()? = color;
        Ok(())
    }

    fn require_time(&mut self) -> Result<&mut Option<f64>, PointError> {
        let format = self.header.point_format();
        if !format.has_time() {
            return Err(PointError::FieldNotInFormat {
                field: FixedField::Time.name(),
                format,
            });
        }
        Ok(&mut self.gps_time)
    }

    fn require_color(&mut self) -> Result<&mut Color, PointError> {
        let format = self.header.point_format();
        if !format.has_color() {
            return Err(PointError::FieldNotInFormat {
                field: "Color",
                format,
            });
        }
        Ok(self.color.get_or_insert_with(Color::default))
    }

    /// The attribute buffer holding the extra dimensions.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replace the attribute buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::BufferTooSmall`] if the buffer is shorter than the header
    /// extra byte size and [`PointError::BufferSizeMismatch`] if it is longer.
    pub fn set_data(&mut self, data: Vec<u8>) -> Result<(), PointError> {
        let expected = self.header.extra_byte_size();
        if data.len() < expected {
            return Err(PointError::BufferTooSmall {
                required: expected,
                actual: data.len(),
            });
        }
        if data.len() > expected {
            return Err(PointError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.data = data;
        Ok(())
    }

    /// Read a dimension by well-known name, schema name or handle.
    ///
    /// Well-known names of the fixed members (`X`, `Intensity`, `Time`, ...)
    /// resolve to the typed members; everything else is looked up in the header
    /// schema and read from the attribute buffer. Handles always address the
    /// attribute buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::UnknownDimension`] if the schema does not declare the
    /// dimension and [`PointError::BufferTooSmall`] if the buffer is too short for it.
    pub fn value<'a>(&self, dimension: impl Into<DimensionRef<'a>>) -> Result<Value, PointError> {
        let dimension = dimension.into();
        if let Some(field) = fixed_field(dimension) {
            return self.fixed_value(field);
        }
        self.header.schema().resolve(dimension)?.read(&self.data)
    }

    /// Write a dimension by well-known name, schema name or handle.
    ///
    /// The value is converted to the type of the target.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::UnknownDimension`] if the schema does not declare the
    /// dimension, [`PointError::BufferTooSmall`] if the buffer is too short for it and
    /// [`PointError::ValueOutOfRange`] if the value does not fit.
    pub fn set_value<'a>(
        &mut self,
        dimension: impl Into<DimensionRef<'a>>,
        value: impl Into<Value>,
    ) -> Result<(), PointError> {
        let dimension = dimension.into();
        let value = value.into();
        if let Some(field) = fixed_field(dimension) {
            return self.set_fixed_value(field, value);
        }
        self.header
            .schema()
            .resolve(dimension)?
            .write(&mut self.data, value)
    }

    fn fixed_value(&self, field: FixedField) -> Result<Value, PointError> {
        let value = match field {
            FixedField::X => Value::F64(self.x()),
            FixedField::Y => Value::F64(self.y()),
            FixedField::Z => Value::F64(self.z()),
            FixedField::Intensity => Value::U16(self.intensity),
            FixedField::ReturnNumber => Value::U8(self.return_number()),
            FixedField::NumberOfReturns => Value::U8(self.number_of_returns()),
            FixedField::ScanDirectionFlag => Value::U8(self.scan_direction()),
            FixedField::EdgeOfFlightLine => Value::U8(self.flight_line_edge()),
            FixedField::Classification => Value::U8(self.classification.code()),
            FixedField::ScanAngleRank => Value::I8(self.scan_angle_rank),
            FixedField::UserData => Value::U8(self.user_data),
            FixedField::PointSourceId => Value::U16(self.point_source_id),
            FixedField::Time => Value::F64(self.gps_time.ok_or(PointError::FieldNotInFormat {
                field: field.name(),
                format: self.header.point_format(),
            })?),
            FixedField::Red | FixedField::Green | FixedField::Blue => {
                let color = self.color.ok_or(PointError::FieldNotInFormat {
                    field: field.name(),
                    format: self.header.point_format(),
                })?;
                Value::U16(match field {
                    FixedField::Red => color.red,
                    FixedField::Green => color.green,
                    _ => color.blue,
                })
            }
        };
        Ok(value)
    }

    fn set_fixed_value(&mut self, field: FixedField, value: Value) -> Result<(), PointError> {
        match field {
            FixedField::X => self.set_x(value.as_f64()),
            FixedField::Y => self.set_y(value.as_f64()),
            FixedField::Z => self.set_z(value.as_f64()),
            FixedField::Intensity => {
                self.intensity = cast_field(field, value)?;
                Ok(())
            }
            FixedField::ReturnNumber => self.set_return_number(cast_field(field, value)?),
            FixedField::NumberOfReturns => self.set_number_of_returns(cast_field(field, value)?),
            FixedField::ScanDirectionFlag => self.set_scan_direction(cast_field(field, value)?),
            FixedField::EdgeOfFlightLine => self.set_flight_line_edge(cast_field(field, value)?),
            FixedField::Classification => {
                self.classification.set_code(cast_field(field, value)?)
            }
            FixedField::ScanAngleRank => self.set_scan_angle_rank(cast_field(field, value)?),
            FixedField::UserData => {
                self.user_data = cast_field(field, value)?;
                Ok(())
            }
            FixedField::PointSourceId => {
                self.point_source_id = cast_field(field, value)?;
                Ok(())
            }
            FixedField::Time => self.set_gps_time(value.as_f64()),
            FixedField::Red => {
                let channel: u16 = cast_field(field, value)?;
                self.require_color()?.red = channel;
                Ok(())
            }
            FixedField::Green => {
                let channel: u16 = cast_field(field, value)?;
                self.require_color()?.green = channel;
                Ok(())
            }
            FixedField::Blue => {
                let channel: u16 = cast_field(field, value)?;
                self.require_color()?.blue = channel;
                Ok(())
            }
        }
    }

    /// Members that hold out-of-range data.
    pub fn invalid_members(&self) -> InvalidMembers {
        let mut invalid = InvalidMembers::empty();
        let format = self.header.point_format();

        if !(SCAN_ANGLE_RANK_MIN..=SCAN_ANGLE_RANK_MAX).contains(&self.scan_angle_rank) {
            invalid.insert(InvalidMembers::SCAN_ANGLE_RANK);
        }
        match self.gps_time {
            Some(time) if !format.has_time() || !time.is_finite() => {
                invalid.insert(InvalidMembers::TIME)
            }
            None if format.has_time() => invalid.insert(InvalidMembers::TIME),
            _ => {}
        }
        if self.color.is_some() != format.has_color() {
            invalid.insert(InvalidMembers::COLOR);
        }
        if self.data.len() != self.header.extra_byte_size() {
            invalid.insert(InvalidMembers::EXTRA_BYTES);
        }
        invalid
    }

    /// Check every point invariant, never fails.
    pub fn validate(&self) -> bool {
        let invalid = self.invalid_members();
        if !invalid.is_empty() {
            log::warn!("invalid point members {} at {}", invalid, self);
        }
        invalid.is_empty()
    }

    /// Same as [`Point::validate`] without logging, the point keeps no cached state.
    pub fn is_valid(&self) -> bool {
        self.invalid_members().is_empty()
    }

    /// Check every point invariant.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::InvalidPointData`] naming the offending members.
    pub fn check(&self) -> Result<(), PointError> {
        let invalid = self.invalid_members();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(PointError::InvalidPointData(invalid))
        }
    }

    /// Compare the scaled coordinates of two points.
    ///
    /// Only X, Y and Z take part; intensity, classification and every other
    /// member are ignored. `==` uses this comparison.
    pub fn equal(&self, other: &Point) -> bool {
        self.coordinates() == other.coordinates()
    }

    /// Export the point as a key-value tree.
    ///
    /// Fixed members come first, then one entry per schema dimension. Schema
    /// dimensions named like a fixed member are left out, the fixed member wins.
    pub fn to_tree(&self) -> Result<serde_json::Value, PointError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl Serialize for Point {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(FixedField::X.name(), &self.x())?;
        map.serialize_entry(FixedField::Y.name(), &self.y())?;
        map.serialize_entry(FixedField::Z.name(), &self.z())?;
        map.serialize_entry(FixedField::Intensity.name(), &self.intensity)?;
        map.serialize_entry(FixedField::ReturnNumber.name(), &self.return_number())?;
        map.serialize_entry(
            FixedField::NumberOfReturns.name(),
            &self.number_of_returns(),
        )?;
        map.serialize_entry(
            FixedField::ScanDirectionFlag.name(),
            &self.scan_direction(),
        )?;
        map.serialize_entry(
            FixedField::EdgeOfFlightLine.name(),
            &self.flight_line_edge(),
        )?;
        map.serialize_entry(
            FixedField::Classification.name(),
            &self.classification.code(),
        )?;
        map.serialize_entry(FixedField::ScanAngleRank.name(), &self.scan_angle_rank)?;
        map.serialize_entry(FixedField::UserData.name(), &self.user_data)?;
        map.serialize_entry(FixedField::PointSourceId.name(), &self.point_source_id)?;
        if let Some(time) = self.gps_time {
            map.serialize_entry(FixedField::Time.name(), &time)?;
        }
        if let Some(color) = &self.color {
            map.serialize_entry("Color", color)?;
        }
        for dimension in self.header.schema() {
            if FixedField::from_name(dimension.name()).is_some() {
                continue;
            }
            let value = dimension.read(&self.data).map_err(S::Error::custom)?;
            map.serialize_entry(dimension.name(), &value)?;
        }
        map.end()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}) intensity {} return {}/{} class {} angle {}",
            self.x(),
            self.y(),
            self.z(),
            self.intensity,
            self.return_number(),
            self.number_of_returns(),
            self.classification,
            self.scan_angle_rank,
        )?;
        if let Some(time) = self.gps_time {
            write!(f, " time {time}")?;
        }
        if let Some(c) = self.color {
            write!(f, " rgb ({}, {}, {})", c.red, c.green, c.blue)?;
        }
        Ok(())
    }
}

fn fixed_field(dimension: DimensionRef<'_>) -> Option<FixedField> {
    match dimension {
        DimensionRef::Name(name) => FixedField::from_name(name),
        DimensionRef::Id(_) => None,
    }
}

fn cast_field<T: NumCast + Bounded>(field: FixedField, value: Value) -> Result<T, PointError> {
    value.cast().ok_or_else(|| {
        PointError::out_of_range(
            field.name(),
            value,
            T::min_value().to_i64().unwrap_or(i64::MIN),
            T::max_value().to_i64().unwrap_or(i64::MAX),
        )
    })
}

// quantize the three coordinates against a single header
fn quantize(header: &Header, coordinates: [f64; 3]) -> Result<[i32; 3], PointError> {
    let mut raw = [0i32; 3];
    for axis in Axis::ALL {
        raw[axis.index()] = transform::to_raw(
            axis,
            coordinates[axis.index()],
            header.scale(axis),
            header.offset(axis),
        )?;
    }
    Ok(raw)
}

fn remap_extra_bytes(
    schema: &Schema,
    data: &[u8],
    header: &Header,
) -> Result<Vec<u8>, PointError> {
    let target = header.schema();
    if target == schema {
        let mut data = data.to_vec();
        data.resize(header.extra_byte_size(), 0);
        return Ok(data);
    }

    let mut remapped = vec![0u8; header.extra_byte_size()];
    for dimension in target {
        if let Some(source) = schema.dimension(dimension.name()) {
            dimension.write(&mut remapped, source.read(data)?)?;
        }
    }
    Ok(remapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::PointFormat;
    use crate::value::ValueType;
    use approx::assert_relative_eq;

    fn header(format: PointFormat) -> Result<Arc<Header>, PointError> {
        let mut schema = Schema::new();
        schema.push("Amplitude", ValueType::F32)?;
        schema.push("Deviation", ValueType::U16)?;
        Ok(Arc::new(Header::new(
            format,
            [0.01, 0.01, 0.001],
            [1000.0, 2000.0, 0.0],
            schema,
        )?))
    }

    #[test]
    fn test_new_point() -> Result<(), PointError> {
        let point = Point::new(header(PointFormat::Format3)?);
        assert_eq!(point.raw_x(), 0);
        assert_relative_eq!(point.x(), 1000.0);
        assert_relative_eq!(point.y(), 2000.0);
        assert_eq!(point.gps_time(), Some(0.0));
        assert_eq!(point.color(), Some(Color::default()));
        assert_eq!(point.data().len(), 6);
        assert!(point.validate());

        let point = Point::new(header(PointFormat::Format0)?);
        assert_eq!(point.gps_time(), None);
        assert_eq!(point.color(), None);
        Ok(())
    }

    #[test]
    fn test_default_point_shares_header() {
        let a = Point::default();
        let b = Point::default();
        assert!(Arc::ptr_eq(a.header(), b.header()));
        assert_eq!(a.header().scale(Axis::X), 0.01);
    }

    #[test]
    fn test_coordinates() -> Result<(), PointError> {
        let mut point = Point::new(header(PointFormat::Format0)?);
        point.set_coordinates(1000.25, 1999.5, 12.345)?;
        assert_eq!(point.raw_x(), 25);
        assert_eq!(point.raw_y(), -50);
        assert_eq!(point.raw_z(), 12345);
        assert_relative_eq!(point.z(), 12.345, epsilon = 1e-9);

        point.set_raw_x(-100);
        assert_relative_eq!(point.x(), 999.0, epsilon = 1e-9);

        point.set_y(2000.07)?;
        assert_eq!(point.raw_y(), 7);
        Ok(())
    }

    #[test]
    fn test_set_coordinates_is_atomic() -> Result<(), PointError> {
        let mut point = Point::new(header(PointFormat::Format0)?);
        point.set_coordinates(1001.0, 2001.0, 1.0)?;
        let res = point.set_coordinates(1002.0, 2002.0, 1e10);
        assert!(matches!(
            res,
            Err(PointError::CoordinateOverflow { axis: Axis::Z, .. })
        ));
        assert_eq!(point.raw_x(), 100);
        assert_eq!(point.raw_y(), 100);
        assert_eq!(point.raw_z(), 1000);
        Ok(())
    }

    #[test]
    fn test_indexed_access() -> Result<(), PointError> {
        let mut point = Point::new(header(PointFormat::Format0)?);
        point.set_coordinates(1010.0, 2020.0, 3.0)?;
        assert_eq!(point.coordinate(0)?, point.x());
        assert_eq!(point.coordinate(1)?, point.y());
        assert_eq!(point.coordinate(2)?, point.z());
        assert!(matches!(
            point.coordinate(3),
            Err(PointError::IndexOutOfRange(3))
        ));
        Ok(())
    }

    #[test]
    fn test_scan_flags() -> Result<(), PointError> {
        let mut point = Point::default();
        point.set_return_number(3)?;
        assert_eq!(point.scan_flags() & 0b111, 0b011);
        point.set_flight_line_edge(1)?;
        assert_eq!(point.scan_flags(), 0b1000_0011);
        assert_eq!(point.return_number(), 3);

        assert!(point.set_number_of_returns(8).is_err());
        assert_eq!(point.scan_flags(), 0b1000_0011);

        point.set_scan_flags(0b0101_0010);
        assert_eq!(point.return_number(), 2);
        assert_eq!(point.number_of_returns(), 2);
        assert_eq!(point.scan_direction(), 1);
        assert_eq!(point.flight_line_edge(), 0);
        Ok(())
    }

    #[test]
    fn test_classification_overloads() -> Result<(), PointError> {
        let mut point = Point::default();
        point.set_classification(Classification::new(2, true, false, true)?);
        assert_eq!(point.classification().bits(), 0b1010_0010);

        point.set_classification(0b0000_0110u8);
        assert_eq!(point.classification().code(), 6);
        assert!(!point.classification().withheld());

        let mut bits = [false; 8];
        bits[0] = true;
        bits[3] = true;
        bits[6] = true;
        point.set_classification(bits);
        assert_eq!(point.classification().code(), 9);
        assert!(point.classification().key_point());
        Ok(())
    }

    #[test]
    fn test_scan_angle_rank_bounds() {
        let mut point = Point::default();
        assert!(point.set_scan_angle_rank(90).is_ok());
        assert!(point.set_scan_angle_rank(-90).is_ok());
        assert!(matches!(
            point.set_scan_angle_rank(91),
            Err(PointError::ValueOutOfRange { value: Value::I8(91), .. })
        ));
        assert!(point.set_scan_angle_rank(-91).is_err());
        assert_eq!(point.scan_angle_rank(), -90);
    }

    #[test]
    fn test_optional_members() -> Result<(), PointError> {
        let mut point = Point::new(header(PointFormat::Format0)?);
        assert!(matches!(
            point.set_gps_time(1.0),
            Err(PointError::FieldNotInFormat { field: "Time", .. })
        ));
        assert!(point.set_color(Color::new(1, 2, 3)).is_err());

        let mut point = Point::new(header(PointFormat::Format3)?);
        point.set_gps_time(4711.5)?;
        point.set_color(Color::new(1, 2, 3))?;
        assert_eq!(point.gps_time(), Some(4711.5));
        assert_eq!(point.color(), Some(Color::new(1, 2, 3)));
        Ok(())
    }

    #[test]
    fn test_values() -> Result<(), PointError> {
        let header = header(PointFormat::Format2)?;
        let mut point = Point::new(header.clone());

        point.set_value("Amplitude", 3.5f32)?;
        point.set_value("Deviation", 12u8)?;
        assert_eq!(point.value("Amplitude")?, Value::F32(3.5));
        assert_eq!(point.value("Deviation")?, Value::U16(12));

        let id = header.schema().id("Deviation").ok_or(PointError::UnknownDimension(
            "Deviation".into(),
        ))?;
        assert_eq!(point.value(id)?, Value::U16(12));

        point.set_value("Intensity", 300i32)?;
        assert_eq!(point.intensity(), 300);
        point.set_value("X", 1001.5)?;
        assert_relative_eq!(point.x(), 1001.5, epsilon = 1e-9);
        point.set_value("Green", 77u16)?;
        assert_eq!(point.value("Green")?, Value::U16(77));
        point.set_value("Classification", 2u8)?;
        assert_eq!(point.classification().code(), 2);

        assert!(matches!(
            point.value("Time"),
            Err(PointError::FieldNotInFormat { .. })
        ));
        assert!(matches!(
            point.value("Nonexistent"),
            Err(PointError::UnknownDimension(name)) if name == "Nonexistent"
        ));
        assert!(matches!(
            point.set_value("ReturnNumber", 9u8),
            Err(PointError::ValueOutOfRange { .. })
        ));
        assert!(point.set_value("Intensity", -1i32).is_err());
        assert!(point.set_value("ScanAngleRank", 120i32).is_err());
        Ok(())
    }

    #[test]
    fn test_values_by_id() -> Result<(), Box<dyn std::error::Error>> {
        let header = header(PointFormat::Format0)?;
        let mut point = Point::new(header.clone());

        let amplitude = header.schema().id("Amplitude").ok_or("missing")?;
        let deviation = header.schema().id("Deviation").ok_or("missing")?;
        point.set_value(amplitude, -0.25f64)?;
        point.set_value(deviation, 65_535u32)?;
        assert_eq!(point.value("Amplitude")?, Value::F32(-0.25));
        assert_eq!(point.value(deviation)?, Value::U16(65_535));
        assert_eq!(&point.data()[4..6], &[0xFF, 0xFF]);

        assert!(matches!(
            point.set_value(deviation, 65_536u32),
            Err(PointError::ValueOutOfRange { value: Value::U32(65_536), .. })
        ));

        let mut other = Schema::new();
        other.push("A", ValueType::U8)?;
        other.push("B", ValueType::U8)?;
        let foreign = other.push("C", ValueType::U8)?;
        assert!(matches!(
            point.set_value(foreign, 1u8),
            Err(PointError::UnknownDimension(name)) if name == "#2"
        ));
        assert_eq!(point.value(deviation)?, Value::U16(65_535));
        Ok(())
    }

    #[test]
    fn test_rejected_float_is_reported_whole() {
        let mut point = Point::default();
        let err = point.set_value("ReturnNumber", 2.5);
        assert!(matches!(
            err,
            Err(PointError::ValueOutOfRange { value: Value::F64(v), .. }) if v == 2.5
        ));
        if let Err(err) = err {
            assert_eq!(
                err.to_string(),
                "Value 2.5 for ReturnNumber is out of range [0, 255]"
            );
        }
        assert_eq!(point.return_number(), 0);
    }

    #[test]
    fn test_short_buffer() -> Result<(), PointError> {
        let header = header(PointFormat::Format0)?;
        let raw = RawPoint {
            extra_bytes: vec![0; 4],
            ..Default::default()
        };
        let mut point = Point::from_raw(header, raw);
        assert_eq!(point.value("Amplitude")?, Value::F32(0.0));
        assert!(matches!(
            point.value("Deviation"),
            Err(PointError::BufferTooSmall {
                required: 6,
                actual: 4
            })
        ));
        assert!(point.set_value("Deviation", 1u16).is_err());
        assert!(!point.is_valid());
        assert!(point.invalid_members().contains(InvalidMembers::EXTRA_BYTES));
        assert!(point.to_tree().is_err());
        Ok(())
    }

    #[test]
    fn test_set_data() -> Result<(), PointError> {
        let mut point = Point::new(header(PointFormat::Format0)?);
        assert!(matches!(
            point.set_data(vec![0; 5]),
            Err(PointError::BufferTooSmall { .. })
        ));
        assert!(matches!(
            point.set_data(vec![0; 7]),
            Err(PointError::BufferSizeMismatch { .. })
        ));
        let mut data = vec![0; 6];
        data[4..6].copy_from_slice(&513u16.to_le_bytes());
        point.set_data(data)?;
        assert_eq!(point.value("Deviation")?, Value::U16(513));
        Ok(())
    }

    #[test]
    fn test_validation() -> Result<(), PointError> {
        let header = header(PointFormat::Format1)?;
        let raw = RawPoint {
            scan_angle_rank: 100,
            gps_time: None,
            color: Some(Color::default()),
            extra_bytes: vec![0; 6],
            ..Default::default()
        };
        let point = Point::from_raw(header.clone(), raw);
        let invalid = point.invalid_members();
        assert!(invalid.contains(InvalidMembers::SCAN_ANGLE_RANK));
        assert!(invalid.contains(InvalidMembers::TIME));
        assert!(invalid.contains(InvalidMembers::COLOR));
        assert!(!invalid.contains(InvalidMembers::EXTRA_BYTES));
        assert!(!point.validate());
        assert!(!point.is_valid());
        assert!(matches!(
            point.check(),
            Err(PointError::InvalidPointData(m)) if m == invalid
        ));
        assert_eq!(invalid.to_string(), "[SCAN_ANGLE_RANK, TIME, COLOR]");
        assert_eq!(invalid.bits(), 0b1110_0000);

        let point = Point::new(header);
        assert!(point.check().is_ok());
        Ok(())
    }

    #[test]
    fn test_equality_is_coordinate_only() -> Result<(), PointError> {
        let header = header(PointFormat::Format0)?;
        let mut a = Point::new(header.clone());
        let mut b = Point::new(header);
        a.set_coordinates(1001.0, 2002.0, 3.0)?;
        b.set_coordinates(1001.0, 2002.0, 3.0)?;
        a.set_intensity(10);
        b.set_intensity(20);
        b.set_classification(Classification::from_code(6)?);
        assert!(a.equal(&b));
        assert_eq!(a, b);

        b.set_z(3.001)?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn test_clone_is_deep() -> Result<(), PointError> {
        let mut a = Point::new(header(PointFormat::Format0)?);
        a.set_value("Deviation", 5u16)?;
        let mut b = a.clone();
        b.set_value("Deviation", 9u16)?;
        assert_eq!(a.value("Deviation")?, Value::U16(5));
        assert_eq!(b.value("Deviation")?, Value::U16(9));
        assert!(Arc::ptr_eq(a.header(), b.header()));
        Ok(())
    }

    #[test]
    fn test_set_header() -> Result<(), PointError> {
        let mut point = Point::new(header(PointFormat::Format0)?);
        point.set_coordinates(1234.56, 2345.67, 7.5)?;
        point.set_value("Amplitude", 2.5f32)?;
        point.set_value("Deviation", 40u16)?;

        let mut schema = Schema::new();
        schema.push("Deviation", ValueType::F64)?;
        schema.push("Echo", ValueType::U8)?;
        let other = Arc::new(Header::new(
            PointFormat::Format1,
            [0.001; 3],
            [0.0; 3],
            schema,
        )?);

        point.set_header(other.clone())?;
        assert_eq!(point.raw_x(), 1_234_560);
        assert_relative_eq!(point.y(), 2345.67, epsilon = 1e-9);
        assert_relative_eq!(point.z(), 7.5, epsilon = 1e-9);
        assert_eq!(point.gps_time(), Some(0.0));
        assert_eq!(point.data().len(), 9);
        assert_eq!(point.value("Deviation")?, Value::F64(40.0));
        assert_eq!(point.value("Echo")?, Value::U8(0));
        assert!(matches!(
            point.value("Amplitude"),
            Err(PointError::UnknownDimension(_))
        ));
        assert!(point.validate());

        let tiny = Arc::new(Header::new(
            PointFormat::Format0,
            [1e-9; 3],
            [0.0; 3],
            Schema::new(),
        )?);
        assert!(point.set_header(tiny).is_err());
        assert!(Arc::ptr_eq(point.header(), &other));
        Ok(())
    }

    #[test]
    fn test_tree() -> Result<(), PointError> {
        let mut point = Point::new(header(PointFormat::Format3)?);
        point.set_coordinates(1001.0, 2002.0, 3.0)?;
        point.set_intensity(42);
        point.set_classification(Classification::from_code(2)?);
        point.set_color(Color::new(10, 20, 30))?;
        point.set_value("Deviation", 7u16)?;

        let tree = point.to_tree()?;
        let keys: Vec<_> = tree
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        assert_eq!(
            keys,
            vec![
                "X",
                "Y",
                "Z",
                "Intensity",
                "ReturnNumber",
                "NumberOfReturns",
                "ScanDirectionFlag",
                "EdgeOfFlightLine",
                "Classification",
                "ScanAngleRank",
                "UserData",
                "PointSourceID",
                "Time",
                "Color",
                "Amplitude",
                "Deviation",
            ]
        );
        assert_eq!(tree["Intensity"], 42);
        assert_eq!(tree["Classification"], 2);
        assert_eq!(tree["Color"]["Green"], 20);
        assert_eq!(tree["Deviation"], 7);
        assert_eq!(tree["X"], 1001.0);
        Ok(())
    }

    #[test]
    fn test_display() {
        let point = Point::default();
        assert_eq!(
            point.to_string(),
            "(0, 0, 0) intensity 0 return 0/0 class Created, never classified (0) angle 0"
        );
    }

    #[test]
    fn test_point_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Point>();
    }
}
