use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PointError;

/// Coordinate axis of a point record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis.
    Z,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Position of the axis in a coordinate triple.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for Axis {
    type Error = PointError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Axis::ALL
            .get(index)
            .copied()
            .ok_or(PointError::IndexOutOfRange(index))
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Convert a raw fixed-point coordinate to its real-world value.
///
/// `scaled = raw * scale + offset`
#[inline]
pub fn to_scaled(raw: i32, scale: f64, offset: f64) -> f64 {
    raw as f64 * scale + offset
}

/// Convert a real-world coordinate to its raw fixed-point value.
///
/// `raw = round((scaled - offset) / scale)`
///
/// The scale factor is validated by the header and is never zero here.
///
/// # Errors
///
/// Returns [`PointError::CoordinateOverflow`] if the rounded value does not fit into an `i32`.
pub fn to_raw(axis: Axis, scaled: f64, scale: f64, offset: f64) -> Result<i32, PointError> {
    let raw = ((scaled - offset) / scale).round();
    if !raw.is_finite() || raw < i32::MIN as f64 || raw > i32::MAX as f64 {
        return Err(PointError::CoordinateOverflow {
            axis,
            value: scaled,
        });
    }
    Ok(raw as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_to_scaled() {
        assert_relative_eq!(to_scaled(12345, 0.01, 1000.0), 1123.45, epsilon = 1e-9);
        assert_relative_eq!(to_scaled(-1, 0.001, 0.0), -0.001, epsilon = 1e-12);
        assert_eq!(to_scaled(0, 0.5, -7.0), -7.0);
    }

    #[test]
    fn test_round_trip() -> Result<(), PointError> {
        let params = [(0.01, 0.0), (0.001, 512_345.6), (1e-7, -180.0), (2.5, 3.0)];
        for (scale, offset) in params {
            for raw in [i32::MIN, -1_000_000, -1, 0, 1, 42, 987_654_321, i32::MAX] {
                let scaled = to_scaled(raw, scale, offset);
                let back = to_raw(Axis::X, scaled, scale, offset)?;
                assert!((back as i64 - raw as i64).abs() <= 1, "{raw} -> {back}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_rounding() -> Result<(), PointError> {
        assert_eq!(to_raw(Axis::Y, 1.006, 0.01, 0.0)?, 101);
        assert_eq!(to_raw(Axis::Y, 1.004, 0.01, 0.0)?, 100);
        assert_eq!(to_raw(Axis::Y, -1.006, 0.01, 0.0)?, -101);
        Ok(())
    }

    #[test]
    fn test_overflow() {
        let res = to_raw(Axis::Z, 1e12, 0.01, 0.0);
        assert!(matches!(
            res,
            Err(PointError::CoordinateOverflow { axis: Axis::Z, .. })
        ));
        assert!(to_raw(Axis::Z, -1e12, 0.01, 0.0).is_err());
        assert!(to_raw(Axis::Z, f64::NAN, 0.01, 0.0).is_err());
        assert!(to_raw(Axis::Z, f64::INFINITY, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_axis_index() {
        assert_eq!(Axis::try_from(2).ok(), Some(Axis::Z));
        assert!(matches!(
            Axis::try_from(3),
            Err(PointError::IndexOutOfRange(3))
        ));
        assert_eq!(Axis::Y.index(), 1);
    }
}
