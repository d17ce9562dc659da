//! One-point transfer-model estimation.
//!
//! Given the last generator/meter sample and a target reading, each model
//! solves its closed-form relation for the generator value that would make
//! the meter read the target. Estimation is pure; inputs outside a model's
//! domain are reported instead of producing NaN or infinity.

use fb_core::ensure_finite;

use crate::error::{RegulationError, RegulationResult};
use crate::method::LinearizationMethod;

/// Estimate the generator value needed to reach `target`.
///
/// # Arguments
///
/// * `method` - Transfer model relating generator and meter
/// * `gen_last` - Last value written to the generator
/// * `met_last` - Meter reading observed at `gen_last`
/// * `target` - Desired meter reading
pub fn estimate_next(
    method: LinearizationMethod,
    gen_last: f64,
    met_last: f64,
    target: f64,
) -> RegulationResult<f64> {
    let domain = |what: &'static str, value: f64| RegulationError::Domain {
        method,
        what,
        value,
    };

    let candidate = match method {
        LinearizationMethod::Proportional => {
            // A zero reading carries no gain information; assume unity.
            let met = if met_last == 0.0 { 1.0 } else { met_last };
            target * gen_last / met
        }
        LinearizationMethod::Offset => gen_last + (target - met_last),
        LinearizationMethod::SquareLaw => {
            if met_last == 0.0 {
                return Err(domain("meter reading must be non-zero", met_last));
            }
            let radicand = target * gen_last * gen_last / met_last;
            if radicand < 0.0 {
                return Err(domain("square root of a negative value", radicand));
            }
            radicand.sqrt()
        }
        LinearizationMethod::InverseSquareLaw => {
            if met_last == 0.0 {
                return Err(domain("meter reading must be non-zero", met_last));
            }
            target * target * gen_last / (met_last * met_last)
        }
        LinearizationMethod::PowerToDecibel => {
            let level = positive_log10(gen_last).ok_or_else(|| {
                domain("generator value must be positive for log10", gen_last)
            })?;
            ((10.0 * level + (target - met_last)) / 10.0).exp()
        }
        LinearizationMethod::DecibelToPower => {
            let (t, m) = log_pair(target, met_last).map_err(|(what, v)| domain(what, v))?;
            gen_last + 10.0 * t - 10.0 * m
        }
        LinearizationMethod::AmplitudeToDecibel => {
            let level = positive_log10(gen_last).ok_or_else(|| {
                domain("generator value must be positive for log10", gen_last)
            })?;
            ((20.0 * level + (target - met_last)) / 20.0).exp()
        }
        LinearizationMethod::DecibelToAmplitude => {
            let (t, m) = log_pair(target, met_last).map_err(|(what, v)| domain(what, v))?;
            gen_last + 20.0 * t - 20.0 * m
        }
    };

    Ok(ensure_finite(candidate, "estimated generator value")?)
}

fn positive_log10(v: f64) -> Option<f64> {
    (v > 0.0).then(|| v.log10())
}

fn log_pair(target: f64, met_last: f64) -> Result<(f64, f64), (&'static str, f64)> {
    let t = positive_log10(target).ok_or(("target must be positive for log10", target))?;
    let m = positive_log10(met_last).ok_or(("meter reading must be positive for log10", met_last))?;
    Ok((t, m))
}
