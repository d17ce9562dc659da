//! Float sanity checks for values crossing the regulator boundary.

use crate::{CoreError, CoreResult};

/// Pass `v` through if it is finite, otherwise name the offending quantity.
pub fn ensure_finite(v: f64, what: &'static str) -> CoreResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}
