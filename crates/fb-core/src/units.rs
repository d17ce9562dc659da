//! Unit label classification.
//!
//! The regulator only cares about how a quantity scales, not its physical
//! dimension: a label is logarithmic (anything in decibels), square-law
//! (power in watts), or linear (everything else).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker that identifies a logarithmic unit (dB, dBm, dBuV, ...).
pub const LOGARITHMIC_MARKER: &str = "DB";

/// Label of the square-law power unit.
pub const POWER_UNIT: &str = "W";

/// Scaling family of a generator or meter quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    #[default]
    Linear,
    Square,
    Logarithmic,
}

impl UnitType {
    /// Classify a unit label. Case-insensitive; the logarithmic marker wins
    /// over the exact power-unit match, unknown labels are linear. The power
    /// match is exact, so padded labels such as `" W"` are linear.
    pub fn detect(label: &str) -> Self {
        let upper = label.to_ascii_uppercase();
        if upper.contains(LOGARITHMIC_MARKER) {
            UnitType::Logarithmic
        } else if upper == POWER_UNIT {
            UnitType::Square
        } else {
            UnitType::Linear
        }
    }

    /// Row/column index in the method selection table.
    pub fn index(self) -> usize {
        match self {
            UnitType::Linear => 0,
            UnitType::Square => 1,
            UnitType::Logarithmic => 2,
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitType::Linear => "linear",
            UnitType::Square => "square",
            UnitType::Logarithmic => "logarithmic",
        };
        f.write_str(name)
    }
}

/// A unit label together with its classification.
///
/// The raw label is kept for diagnostics only; all regulation decisions use
/// the derived [`UnitType`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitLabel {
    raw: String,
    kind: UnitType,
}

impl UnitLabel {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let kind = UnitType::detect(&raw);
        Self { raw, kind }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn unit_type(&self) -> UnitType {
        self.kind
    }
}

impl From<&str> for UnitLabel {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for UnitLabel {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for UnitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.raw, self.kind)
    }
}
