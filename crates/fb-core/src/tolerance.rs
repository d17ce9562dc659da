//! Acceptance windows around a target value.

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// How a tolerance value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceKind {
    /// Literal value in the meter's unit.
    Absolute,
    /// Percentage of the reference value.
    #[default]
    Relative,
}

/// A tolerance value together with its interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub value: f64,
    pub kind: ToleranceKind,
}

impl Tolerance {
    pub fn absolute(value: f64) -> Self {
        Self {
            value,
            kind: ToleranceKind::Absolute,
        }
    }

    pub fn relative(percent: f64) -> Self {
        Self {
            value: percent,
            kind: ToleranceKind::Relative,
        }
    }

    /// Half-width of the acceptance window around `reference`.
    pub fn window(&self, reference: f64) -> f64 {
        compute_tolerance(self.kind, self.value, reference)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !self.value.is_finite() {
            return Err(CoreError::NonFinite {
                what: "tolerance",
                value: self.value,
            });
        }
        if self.value < 0.0 {
            return Err(CoreError::InvalidArg {
                what: "tolerance must be non-negative",
            });
        }
        Ok(())
    }
}

impl Default for Tolerance {
    /// 1 % of the target.
    fn default() -> Self {
        Self::relative(1.0)
    }
}

/// Convert a tolerance into an absolute window half-width around `reference`.
pub fn compute_tolerance(kind: ToleranceKind, value: f64, reference: f64) -> f64 {
    match kind {
        ToleranceKind::Relative => reference.abs() * value / 100.0,
        ToleranceKind::Absolute => value,
    }
}
