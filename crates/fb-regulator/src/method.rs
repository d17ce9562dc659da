//! Transfer-function families and their selection table.

use std::fmt;

use fb_core::UnitType;
use serde::{Deserialize, Serialize};

use crate::error::RegulationError;

/// Closed-form relation assumed between generator value `G` and meter value `M`.
///
/// Serialized as its numeric id (0..=7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LinearizationMethod {
    /// `M = a*G`
    Proportional,
    /// `M = G + q`
    Offset,
    /// `M = a*G^2`
    SquareLaw,
    /// `M^2 = a*G`
    InverseSquareLaw,
    /// `M = 10*log10(G) + q`
    PowerToDecibel,
    /// `10*log10(M) = G + q`
    DecibelToPower,
    /// `M = 20*log10(G) + q`
    AmplitudeToDecibel,
    /// `20*log10(M) = G + q`
    DecibelToAmplitude,
}

/// Method indexed by `[generator unit][meter unit]`.
const METHOD_TABLE: [[LinearizationMethod; 3]; 3] = {
    use LinearizationMethod::*;
    [
        [Proportional, SquareLaw, AmplitudeToDecibel],
        [InverseSquareLaw, Proportional, PowerToDecibel],
        [DecibelToAmplitude, DecibelToPower, Offset],
    ]
};

/// Pick the transfer model for a generator/meter unit pair.
pub fn detect_method(generator: UnitType, meter: UnitType) -> LinearizationMethod {
    METHOD_TABLE[generator.index()][meter.index()]
}

impl LinearizationMethod {
    pub const ALL: [LinearizationMethod; 8] = [
        LinearizationMethod::Proportional,
        LinearizationMethod::Offset,
        LinearizationMethod::SquareLaw,
        LinearizationMethod::InverseSquareLaw,
        LinearizationMethod::PowerToDecibel,
        LinearizationMethod::DecibelToPower,
        LinearizationMethod::AmplitudeToDecibel,
        LinearizationMethod::DecibelToAmplitude,
    ];

    pub fn id(self) -> u8 {
        match self {
            LinearizationMethod::Proportional => 0,
            LinearizationMethod::Offset => 1,
            LinearizationMethod::SquareLaw => 2,
            LinearizationMethod::InverseSquareLaw => 3,
            LinearizationMethod::PowerToDecibel => 4,
            LinearizationMethod::DecibelToPower => 5,
            LinearizationMethod::AmplitudeToDecibel => 6,
            LinearizationMethod::DecibelToAmplitude => 7,
        }
    }

    /// Human-readable relation, e.g. `M = G + q`.
    pub fn relation(self) -> &'static str {
        match self {
            LinearizationMethod::Proportional => "M = a*G",
            LinearizationMethod::Offset => "M = G + q",
            LinearizationMethod::SquareLaw => "M = a*G^2",
            LinearizationMethod::InverseSquareLaw => "M^2 = a*G",
            LinearizationMethod::PowerToDecibel => "M = 10*log10(G) + q",
            LinearizationMethod::DecibelToPower => "10*log10(M) = G + q",
            LinearizationMethod::AmplitudeToDecibel => "M = 20*log10(G) + q",
            LinearizationMethod::DecibelToAmplitude => "20*log10(M) = G + q",
        }
    }
}

impl TryFrom<u8> for LinearizationMethod {
    type Error = RegulationError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(RegulationError::InvalidMethod { id })
    }
}

impl From<LinearizationMethod> for u8 {
    fn from(method: LinearizationMethod) -> Self {
        method.id()
    }
}

impl fmt::Display for LinearizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method {} ({})", self.id(), self.relation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_unit_pairs() {
        use UnitType::*;
        let expected = [
            (Linear, Linear, 0),
            (Linear, Square, 2),
            (Linear, Logarithmic, 6),
            (Square, Linear, 3),
            (Square, Square, 0),
            (Square, Logarithmic, 4),
            (Logarithmic, Linear, 7),
            (Logarithmic, Square, 5),
            (Logarithmic, Logarithmic, 1),
        ];
        for (generator, meter, id) in expected {
            assert_eq!(detect_method(generator, meter).id(), id, "{generator}/{meter}");
        }
    }

    #[test]
    fn ids_round_trip_through_try_from() {
        for method in LinearizationMethod::ALL {
            assert_eq!(LinearizationMethod::try_from(method.id()).unwrap(), method);
        }
    }

    #[test]
    fn undefined_id_rejected() {
        assert_eq!(
            LinearizationMethod::try_from(8),
            Err(RegulationError::InvalidMethod { id: 8 })
        );
    }

    #[test]
    fn serializes_as_integer_id() {
        let json = serde_json::to_string(&LinearizationMethod::DecibelToPower).unwrap();
        assert_eq!(json, "5");
        let parsed: LinearizationMethod = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, LinearizationMethod::Offset);
        assert!(serde_json::from_str::<LinearizationMethod>("9").is_err());
    }
}
