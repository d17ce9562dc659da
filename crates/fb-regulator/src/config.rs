//! Long-lived regulator settings.

use fb_core::Tolerance;
use serde::{Deserialize, Serialize};

use crate::error::{RegulationError, RegulationResult};
use crate::method::LinearizationMethod;

/// Caller-set regulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulatorConfig {
    /// Generator value written before any estimation.
    pub safe_start_value: f64,
    /// Damping applied to each step, in [0, 1]. Decays with the step index.
    pub conservative_factor: f64,
    /// Maximum number of regulation steps.
    pub max_steps: usize,
    /// Largest allowed generator change per step. `None` is unlimited.
    pub max_step_size: Option<f64>,
    /// Acceptance window around the target.
    pub tolerance: Tolerance,
    /// Settling time after each generator write (milliseconds).
    pub settle_ms: u64,
    /// Primary transfer model. `None` selects it from the unit types.
    pub method: Option<LinearizationMethod>,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            safe_start_value: -35.0,
            conservative_factor: 0.5,
            max_steps: 16,
            max_step_size: None,
            tolerance: Tolerance::default(),
            settle_ms: 10,
            method: None,
        }
    }
}

impl RegulatorConfig {
    pub fn with_safe_start(mut self, value: f64) -> Self {
        self.safe_start_value = value;
        self
    }

    pub fn with_conservative_factor(mut self, factor: f64) -> Self {
        self.conservative_factor = factor;
        self
    }

    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    pub fn with_max_step_size(mut self, size: f64) -> Self {
        self.max_step_size = Some(size);
        self
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_settle_ms(mut self, ms: u64) -> Self {
        self.settle_ms = ms;
        self
    }

    pub fn with_method(mut self, method: LinearizationMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn validate(&self) -> RegulationResult<()> {
        if !self.safe_start_value.is_finite() {
            return Err(RegulationError::InvalidArg {
                what: "safe_start_value must be finite",
            });
        }
        if !(0.0..=1.0).contains(&self.conservative_factor) {
            return Err(RegulationError::InvalidArg {
                what: "conservative_factor must lie in [0, 1]",
            });
        }
        if let Some(size) = self.max_step_size {
            if size.is_nan() || size < 0.0 {
                return Err(RegulationError::InvalidArg {
                    what: "max_step_size must be non-negative",
                });
            }
        }
        self.tolerance.validate()?;
        Ok(())
    }
}

/// Settings for the optional limiting meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitingConfig {
    /// Ceiling the limiting reading must not exceed.
    pub limit: f64,
    /// Window below the limit that counts as limit-bound success.
    pub tolerance: Tolerance,
    /// Transfer model between generator and limiting meter.
    pub method: LinearizationMethod,
}

impl LimitingConfig {
    pub fn new(limit: f64, tolerance: Tolerance, method: LinearizationMethod) -> Self {
        Self {
            limit,
            tolerance,
            method,
        }
    }

    pub fn validate(&self) -> RegulationResult<()> {
        if !self.limit.is_finite() {
            return Err(RegulationError::InvalidArg {
                what: "limit must be finite",
            });
        }
        self.tolerance.validate()?;
        Ok(())
    }
}
