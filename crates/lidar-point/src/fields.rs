/// Fixed member of a point record, addressable by its well-known dimension name.
///
/// Names resolve to the typed members of [`crate::Point`] without going through
/// the header schema, so the read API stays the same whether or not a schema
/// describes these members.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FixedField {
    /// Scaled X coordinate.
    X,
    /// Scaled Y coordinate.
    Y,
    /// Scaled Z coordinate.
    Z,
    /// Pulse return magnitude.
    Intensity,
    /// Return number of the pulse.
    ReturnNumber,
    /// Number of returns of the pulse.
    NumberOfReturns,
    /// Scan direction flag.
    ScanDirectionFlag,
    /// Edge of flight line flag.
    EdgeOfFlightLine,
    /// Classification code.
    Classification,
    /// Scan angle rank.
    ScanAngleRank,
    /// User data (file marker).
    UserData,
    /// Point source id (user bit field).
    PointSourceId,
    /// GPS time.
    Time,
    /// Red color channel.
    Red,
    /// Green color channel.
    Green,
    /// Blue color channel.
    Blue,
}

impl FixedField {
    /// Every fixed member in record order.
    pub const ALL: [FixedField; 16] = [
        FixedField::X,
        FixedField::Y,
        FixedField::Z,
        FixedField::Intensity,
        FixedField::ReturnNumber,
        FixedField::NumberOfReturns,
        FixedField::ScanDirectionFlag,
        FixedField::EdgeOfFlightLine,
        FixedField::Classification,
        FixedField::ScanAngleRank,
        FixedField::UserData,
        FixedField::PointSourceId,
        FixedField::Time,
        FixedField::Red,
        FixedField::Green,
        FixedField::Blue,
    ];

    /// The well-known dimension name.
    pub fn name(&self) -> &'static str {
        match self {
            FixedField::X => "X",
            FixedField::Y => "Y",
            FixedField::Z => "Z",
            FixedField::Intensity => "Intensity",
            FixedField::ReturnNumber => "ReturnNumber",
            FixedField::NumberOfReturns => "NumberOfReturns",
            FixedField::ScanDirectionFlag => "ScanDirectionFlag",
            FixedField::EdgeOfFlightLine => "EdgeOfFlightLine",
            FixedField::Classification => "Classification",
            FixedField::ScanAngleRank => "ScanAngleRank",
            FixedField::UserData => "UserData",
            FixedField::PointSourceId => "PointSourceID",
            FixedField::Time => "Time",
            FixedField::Red => "Red",
            FixedField::Green => "Green",
            FixedField::Blue => "Blue",
        }
    }

    /// Look up a fixed member by its well-known name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for field in FixedField::ALL {
            assert_eq!(FixedField::from_name(field.name()), Some(field));
        }
        assert_eq!(
            FixedField::from_name("PointSourceID"),
            Some(FixedField::PointSourceId)
        );
        assert_eq!(FixedField::from_name("x"), None);
        assert_eq!(FixedField::from_name("Amplitude"), None);
    }
}
