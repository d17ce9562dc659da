//! Error types for regulation runs.

use std::fmt;

use fb_core::CoreError;
use thiserror::Error;

use crate::method::LinearizationMethod;

/// Result type for regulation operations.
pub type RegulationResult<T> = Result<T, RegulationError>;

/// Which channel an I/O failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Generator,
    Meter,
    LimitingMeter,
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelRole::Generator => "generator",
            ChannelRole::Meter => "meter",
            ChannelRole::LimitingMeter => "limiting meter",
        };
        f.write_str(name)
    }
}

/// Errors that abort a regulation run.
///
/// Running out of steps is not an error; it is reported as an exhausted
/// outcome so callers can tell a hardware fault or a model mismatch apart
/// from a run that simply did not settle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegulationError {
    /// Regulation requested before the controller was fully set up.
    #[error("Configuration error: {what}")]
    Configuration { what: &'static str },

    /// An endpoint returned nothing or declined a write.
    #[error("I/O failure on {channel}: {what}")]
    Io {
        channel: ChannelRole,
        what: &'static str,
    },

    /// A transfer model was evaluated outside its valid input domain.
    #[error("Domain error in {method}: {what} (value={value})")]
    Domain {
        method: LinearizationMethod,
        what: &'static str,
        value: f64,
    },

    /// Linearization method id outside 0..=7.
    #[error("Invalid linearization method id: {id}")]
    InvalidMethod { id: u8 },

    /// Invalid controller configuration value.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl RegulationError {
    pub(crate) fn io(channel: ChannelRole, what: &'static str) -> Self {
        Self::Io { channel, what }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
