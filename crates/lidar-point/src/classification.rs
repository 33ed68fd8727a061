use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PointError;

const CODE_MASK: u8 = 0b0001_1111;
const SYNTHETIC_BIT: u8 = 5;
const KEY_POINT_BIT: u8 = 6;
const WITHHELD_BIT: u8 = 7;

/// Largest classification code that fits in the 5-bit field.
pub const MAX_CODE: u8 = CODE_MASK;

/// Ground cover or object class with an assigned meaning.
///
/// Codes 10, 11 and 13 to 31 are reserved and have no variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClassKind {
    /// Created, never classified.
    Created = 0,
    /// Unclassified.
    Unclassified = 1,
    /// Ground.
    Ground = 2,
    /// Low vegetation.
    LowVegetation = 3,
    /// Medium vegetation.
    MediumVegetation = 4,
    /// High vegetation.
    HighVegetation = 5,
    /// Building.
    Building = 6,
    /// Low point (noise).
    LowPoint = 7,
    /// Model key-point (mass point).
    ModelKeyPoint = 8,
    /// Water.
    Water = 9,
    /// Overlap points.
    OverlapPoints = 12,
}

impl ClassKind {
    /// Look up the class of a code, `None` for reserved codes.
    pub fn from_code(code: u8) -> Option<Self> {
        let kind = match code {
            0 => ClassKind::Created,
            1 => ClassKind::Unclassified,
            2 => ClassKind::Ground,
            3 => ClassKind::LowVegetation,
            4 => ClassKind::MediumVegetation,
            5 => ClassKind::HighVegetation,
            6 => ClassKind::Building,
            7 => ClassKind::LowPoint,
            8 => ClassKind::ModelKeyPoint,
            9 => ClassKind::Water,
            12 => ClassKind::OverlapPoints,
            _ => return None,
        };
        Some(kind)
    }

    /// The numeric code of the class.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human readable name of the class.
    pub fn name(self) -> &'static str {
        match self {
            ClassKind::Created => "Created, never classified",
            ClassKind::Unclassified => "Unclassified",
            ClassKind::Ground => "Ground",
            ClassKind::LowVegetation => "Low Vegetation",
            ClassKind::MediumVegetation => "Medium Vegetation",
            ClassKind::HighVegetation => "High Vegetation",
            ClassKind::Building => "Building",
            ClassKind::LowPoint => "Low Point (noise)",
            ClassKind::ModelKeyPoint => "Model Key-point (mass point)",
            ClassKind::Water => "Water",
            ClassKind::OverlapPoints => "Overlap Points",
        }
    }
}

/// Classification of a point record packed into a single byte.
///
/// Bits 0 to 4 hold the class code, bit 5 the synthetic flag, bit 6 the
/// key-point flag and bit 7 the withheld flag.
///
/// # Examples
///
/// ```
/// use lidar_point::{ClassKind, Classification};
///
/// let cls = Classification::new(2, true, false, true).unwrap();
/// assert_eq!(cls.kind(), Some(ClassKind::Ground));
/// assert_eq!(cls.bits(), 0b1010_0010);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Classification(u8);

impl Classification {
    /// Decode a packed classification byte.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Build a classification from a set of 8 bits, bit 0 first.
    pub fn from_bit_set(bits: [bool; 8]) -> Self {
        let packed = bits
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &set)| acc | ((set as u8) << i));
        Self(packed)
    }

    /// Build a classification from a code alone, with all flags cleared.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::ValueOutOfRange`] if `code` is larger than 31.
    pub fn from_code(code: u8) -> Result<Self, PointError> {
        let mut cls = Self::default();
        cls.set_code(code)?;
        Ok(cls)
    }

    /// Build a classification from a code and the three flags.
    pub fn new(
        code: u8,
        synthetic: bool,
        key_point: bool,
        withheld: bool,
    ) -> Result<Self, PointError> {
        let mut cls = Self::from_code(code)?;
        cls.set_synthetic(synthetic);
        cls.set_key_point(key_point);
        cls.set_withheld(withheld);
        Ok(cls)
    }

    /// The packed byte.
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// The 8 bits of the packed byte, bit 0 first.
    pub fn bit_set(&self) -> [bool; 8] {
        std::array::from_fn(|i| self.0 & (1 << i) != 0)
    }

    /// The 5-bit class code.
    pub const fn code(&self) -> u8 {
        self.0 & CODE_MASK
    }

    /// Set the class code leaving the flags untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::ValueOutOfRange`] if `code` is larger than 31.
    pub fn set_code(&mut self, code: u8) -> Result<(), PointError> {
        if code > MAX_CODE {
            return Err(PointError::out_of_range(
                "Classification",
                code,
                0,
                MAX_CODE as i64,
            ));
        }
        self.0 = (self.0 & !CODE_MASK) | code;
        Ok(())
    }

    /// The semantic class, `None` for reserved codes.
    pub fn kind(&self) -> Option<ClassKind> {
        ClassKind::from_code(self.code())
    }

    /// Name of the class or the reserved marker.
    pub fn name(&self) -> &'static str {
        self.kind()
            .map(ClassKind::name)
            .unwrap_or("Reserved for ASPRS Definition")
    }

    /// Point created by a technique other than LIDAR collection.
    pub const fn synthetic(&self) -> bool {
        self.bit(SYNTHETIC_BIT)
    }

    /// Set the synthetic flag.
    pub fn set_synthetic(&mut self, value: bool) {
        self.set_bit(SYNTHETIC_BIT, value);
    }

    /// Point considered a model key-point.
    pub const fn key_point(&self) -> bool {
        self.bit(KEY_POINT_BIT)
    }

    /// Set the key-point flag.
    pub fn set_key_point(&mut self, value: bool) {
        self.set_bit(KEY_POINT_BIT, value);
    }

    /// Point that should not be included in processing.
    pub const fn withheld(&self) -> bool {
        self.bit(WITHHELD_BIT)
    }

    /// Set the withheld flag.
    pub fn set_withheld(&mut self, value: bool) {
        self.set_bit(WITHHELD_BIT, value);
    }

    const fn bit(&self, index: u8) -> bool {
        self.0 & (1 << index) != 0
    }

    fn set_bit(&mut self, index: u8, value: bool) {
        if value {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }
}

impl From<u8> for Classification {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<[bool; 8]> for Classification {
    fn from(bits: [bool; 8]) -> Self {
        Self::from_bit_set(bits)
    }
}

impl From<ClassKind> for Classification {
    fn from(kind: ClassKind) -> Self {
        Self(kind.code())
    }
}

impl From<Classification> for u8 {
    fn from(cls: Classification) -> Self {
        cls.0
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())?;
        for (set, flag) in [
            (self.synthetic(), "synthetic"),
            (self.key_point(), "key-point"),
            (self.withheld(), "withheld"),
        ] {
            if set {
                write!(f, " {flag}")?;
            }
        }
        Ok(())
    }
}
