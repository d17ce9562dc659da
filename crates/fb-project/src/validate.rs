//! Setup validation logic.

use crate::schema::{CalibrationSetup, ChannelDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_setup(setup: &CalibrationSetup) -> Result<(), ValidationError> {
    if setup.version == 0 || setup.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: setup.version,
        });
    }

    validate_channel("generator.unit", &setup.generator)?;
    validate_channel("meter.unit", &setup.meter)?;

    setup
        .regulator
        .validate()
        .map_err(|e| ValidationError::InvalidValue {
            field: "regulator".to_string(),
            value: format!("{:?}", setup.regulator),
            reason: e.to_string(),
        })?;

    if let Some(limiting) = &setup.limiting {
        if limiting.unit.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "limiting.unit".to_string(),
                value: limiting.unit.clone(),
                reason: "unit label must not be empty".to_string(),
            });
        }
        limiting
            .to_config()
            .validate()
            .map_err(|e| ValidationError::InvalidValue {
                field: "limiting".to_string(),
                value: format!("limit={} tolerance={:?}", limiting.limit, limiting.tolerance),
                reason: e.to_string(),
            })?;
    }

    Ok(())
}

fn validate_channel(field: &str, channel: &ChannelDef) -> Result<(), ValidationError> {
    if channel.unit.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: channel.unit.clone(),
            reason: "unit label must not be empty".to_string(),
        });
    }
    Ok(())
}
