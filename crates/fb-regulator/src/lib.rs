//! Closed-loop calibration regulator.
//!
//! Drives a generator so that a meter reads a requested target within
//! tolerance, while an optional limiting meter stays under a ceiling.
//!
//! # Architecture
//!
//! - Endpoints are caller-supplied capabilities ([`Endpoint`], [`Generator`])
//! - Each endpoint is wrapped in a [`SignalChannel`] that records accepted samples
//! - The generator/meter relation is one of eight [`LinearizationMethod`]s,
//!   picked from the unit types of the two channels
//! - [`RegulationController`] runs the one-point estimation loop with
//!   damping, step clamping and limiting-meter reconciliation
//! - The settling wait between steps is an injected [`Delay`]

pub mod config;
pub mod controller;
pub mod delay;
pub mod error;
pub mod estimator;
pub mod method;
pub mod signal;

pub use config::{LimitingConfig, RegulatorConfig};
pub use controller::{
    RegulationController, RegulationOutcome, RegulationReport, RegulationState, clamped_delta,
    damped_delta, limited_convergence,
};
pub use delay::{Delay, NoDelay, ThreadSleep};
pub use error::{ChannelRole, RegulationError, RegulationResult};
pub use estimator::estimate_next;
pub use method::{LinearizationMethod, detect_method};
pub use signal::{
    Endpoint, FnGenerator, FnMeter, Generator, GeneratorChannel, MeterChannel, SignalChannel,
    generator_fn, meter_fn,
};
