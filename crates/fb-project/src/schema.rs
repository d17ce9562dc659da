//! Calibration setup file schema.

use fb_core::{Tolerance, UnitType};
use fb_regulator::{LimitingConfig, LinearizationMethod, RegulatorConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationSetup {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub regulator: RegulatorConfig,
    pub generator: ChannelDef,
    pub meter: ChannelDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limiting: Option<LimitingDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelDef {
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ChannelDef {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            description: None,
        }
    }

    pub fn unit_type(&self) -> UnitType {
        UnitType::detect(&self.unit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitingDef {
    pub unit: String,
    pub limit: f64,
    pub tolerance: Tolerance,
    pub method: LinearizationMethod,
}

impl LimitingDef {
    pub fn to_config(&self) -> LimitingConfig {
        LimitingConfig::new(self.limit, self.tolerance, self.method)
    }
}
