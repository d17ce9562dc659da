//! fb-core: shared foundation for the feedback regulator.
//!
//! Contains:
//! - units (unit label classification into linear / square / logarithmic)
//! - tolerance (absolute / relative acceptance windows)
//! - numeric (finite-value checks)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod tolerance;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::ensure_finite;
pub use tolerance::{Tolerance, ToleranceKind, compute_tolerance};
pub use units::{UnitLabel, UnitType};
