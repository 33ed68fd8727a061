use crate::error::PointError;

/// A sub-byte field packed into a single byte.
///
/// The field occupies `width` bits starting at bit `offset`, counting from the
/// least significant bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitField {
    name: &'static str,
    offset: u8,
    width: u8,
}

/// Return number of the pulse, bits 0 to 2.
pub const RETURN_NUMBER: BitField = BitField::new("ReturnNumber", 0, 3);

/// Number of returns of the pulse, bits 3 to 5.
pub const NUMBER_OF_RETURNS: BitField = BitField::new("NumberOfReturns", 3, 3);

/// Scan direction flag, bit 6.
pub const SCAN_DIRECTION: BitField = BitField::new("ScanDirectionFlag", 6, 1);

/// Edge of flight line flag, bit 7.
pub const FLIGHT_LINE_EDGE: BitField = BitField::new("EdgeOfFlightLine", 7, 1);

impl BitField {
    /// Create a new field descriptor.
    ///
    /// # Panics
    ///
    /// Panics if the field is empty or does not fit into a byte. In a const
    /// context this is a compile-time error.
    pub const fn new(name: &'static str, offset: u8, width: u8) -> Self {
        assert!(
            width > 0 && offset as u16 + width as u16 <= 8,
            "bit field must fit into a byte"
        );
        Self {
            name,
            offset,
            width,
        }
    }

    /// Name of the field, used in error reports.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Position of the lowest bit of the field.
    #[inline]
    pub const fn offset(&self) -> u8 {
        self.offset
    }

    /// Number of bits of the field.
    #[inline]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Largest value the field can hold.
    #[inline]
    pub const fn max_value(&self) -> u8 {
        ((1u16 << self.width) - 1) as u8
    }

    /// Mask selecting the field bits in place.
    #[inline]
    pub const fn mask(&self) -> u8 {
        self.max_value() << self.offset
    }

    /// Extract the field value from the packed byte.
    #[inline]
    pub const fn get(&self, byte: u8) -> u8 {
        (byte & self.mask()) >> self.offset
    }

    /// Inject a value into the packed byte leaving the other bits untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::ValueOutOfRange`] if `value` does not fit into the field width.
    pub fn set(&self, byte: u8, value: u8) -> Result<u8, PointError> {
        if value > self.max_value() {
            return Err(PointError::out_of_range(
                self.name,
                value,
                0,
                self.max_value() as i64,
            ));
        }
        Ok((byte & !self.mask()) | (value << self.offset))
    }
}

/// Scan flags packed into a single byte.
///
/// The byte holds the return number, the number of returns, the scan direction
/// flag and the edge of flight line flag.
///
/// # Examples
///
/// ```
/// use lidar_point::ScanFlags;
///
/// let mut flags = ScanFlags::default();
/// flags.set_return_number(3).unwrap();
/// flags.set_flight_line_edge(1).unwrap();
///
/// assert_eq!(flags.return_number(), 3);
/// assert_eq!(flags.bits(), 0b1000_0011);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScanFlags(u8);

impl ScanFlags {
    /// Wrap an already packed byte.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// The packed byte.
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Read any field of the byte.
    #[inline]
    pub const fn get(&self, field: BitField) -> u8 {
        field.get(self.0)
    }

    /// Write any field of the byte, re-packing only that field.
    pub fn set(&mut self, field: BitField, value: u8) -> Result<(), PointError> {
        self.0 = field.set(self.0, value)?;
        Ok(())
    }

    /// Return number, bits 0 to 2.
    pub const fn return_number(&self) -> u8 {
        self.get(RETURN_NUMBER)
    }

    /// Set the return number.
    pub fn set_return_number(&mut self, value: u8) -> Result<(), PointError> {
        self.set(RETURN_NUMBER, value)
    }

    /// Number of returns, bits 3 to 5.
    pub const fn number_of_returns(&self) -> u8 {
        self.get(NUMBER_OF_RETURNS)
    }

    /// Set the number of returns.
    pub fn set_number_of_returns(&mut self, value: u8) -> Result<(), PointError> {
        self.set(NUMBER_OF_RETURNS, value)
    }

    /// Scan direction flag, bit 6.
    pub const fn scan_direction(&self) -> u8 {
        self.get(SCAN_DIRECTION)
    }

    /// Set the scan direction flag.
    pub fn set_scan_direction(&mut self, value: u8) -> Result<(), PointError> {
        self.set(SCAN_DIRECTION, value)
    }

    /// Edge of flight line flag, bit 7.
    pub const fn flight_line_edge(&self) -> u8 {
        self.get(FLIGHT_LINE_EDGE)
    }

    /// Set the edge of flight line flag.
    pub fn set_flight_line_edge(&mut self, value: u8) -> Result<(), PointError> {
        self.set(FLIGHT_LINE_EDGE, value)
    }
}

impl From<u8> for ScanFlags {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<ScanFlags> for u8 {
    fn from(flags: ScanFlags) -> Self {
        flags.0
    }
}
