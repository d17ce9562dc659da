//! Closed-loop regulation controller.
//!
//! Drives a generator until a meter reads the requested target within
//! tolerance, optionally never letting a second, limiting meter exceed a
//! ceiling. Each step:
//! - reads the meter (and the limiting meter)
//! - checks convergence, with the limiting ceiling overriding it
//! - estimates the next generator value from the last sample
//! - keeps the less aggressive of the target and limiting deltas
//! - damps and clamps the delta, writes it, waits for settling

use fb_core::{UnitLabel, ensure_finite};
use tracing::{debug, info, warn};

use crate::config::{LimitingConfig, RegulatorConfig};
use crate::delay::{Delay, ThreadSleep};
use crate::error::{ChannelRole, RegulationError, RegulationResult};
use crate::estimator::estimate_next;
use crate::method::{LinearizationMethod, detect_method};
use crate::signal::{Endpoint, Generator, GeneratorChannel, MeterChannel};

const NOT_CONFIGURED: &str = "generator and meter must both be configured";

/// Lifecycle of the most recent regulation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegulationState {
    #[default]
    Idle,
    Running,
    Converged,
    Exhausted,
    Failed,
}

/// How a regulation run ended when no error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulationOutcome {
    /// Meter within tolerance, or limit-bound within the limiting tolerance.
    Converged,
    /// All steps used without meeting the tolerance.
    Exhausted,
}

/// Summary of a completed regulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RegulationReport {
    pub outcome: RegulationOutcome,
    /// Number of steps executed, including the converging one.
    pub steps: usize,
    pub method: LinearizationMethod,
    pub limiting_method: Option<LinearizationMethod>,
    /// Last value accepted by the generator.
    pub generator: Option<f64>,
    /// Last meter reading.
    pub meter: Option<f64>,
    /// Last limiting meter reading.
    pub limiting_meter: Option<f64>,
}

impl RegulationReport {
    pub fn converged(&self) -> bool {
        self.outcome == RegulationOutcome::Converged
    }
}

struct LimitingMeter {
    channel: MeterChannel,
    config: LimitingConfig,
}

/// Feedback regulator owning the generator, meter and optional limiting
/// meter channels.
///
/// Configuration must not change while a regulation request is running;
/// `&mut self` on every entry point enforces exclusive use.
pub struct RegulationController {
    config: RegulatorConfig,
    generator: Option<GeneratorChannel>,
    meter: Option<MeterChannel>,
    limiting: Option<LimitingMeter>,
    delay: Box<dyn Delay>,
    method: Option<LinearizationMethod>,
    step_counter: usize,
    state: RegulationState,
}

impl Default for RegulationController {
    fn default() -> Self {
        Self::new()
    }
}

impl RegulationController {
    /// Controller with default settings and a blocking settling delay.
    pub fn new() -> Self {
        Self {
            config: RegulatorConfig::default(),
            generator: None,
            meter: None,
            limiting: None,
            delay: Box::new(ThreadSleep),
            method: None,
            step_counter: 0,
            state: RegulationState::Idle,
        }
    }

    pub fn with_config(config: RegulatorConfig) -> RegulationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    pub fn with_delay(mut self, delay: impl Delay + 'static) -> Self {
        self.set_delay(delay);
        self
    }

    pub fn set_delay(&mut self, delay: impl Delay + 'static) {
        self.delay = Box::new(delay);
    }

    pub fn config(&self) -> &RegulatorConfig {
        &self.config
    }

    /// Mutable access to the settings. Checked again on the next run.
    pub fn config_mut(&mut self) -> &mut RegulatorConfig {
        &mut self.config
    }

    pub fn set_generator(&mut self, endpoint: impl Generator + 'static, unit: impl Into<UnitLabel>) {
        self.generator = Some(GeneratorChannel::generator(endpoint, unit));
    }

    pub fn set_meter(&mut self, endpoint: impl Endpoint + 'static, unit: impl Into<UnitLabel>) {
        self.meter = Some(MeterChannel::meter(endpoint, unit));
    }

    pub fn set_limiting_meter(
        &mut self,
        endpoint: impl Endpoint + 'static,
        unit: impl Into<UnitLabel>,
        config: LimitingConfig,
    ) -> RegulationResult<()> {
        config.validate()?;
        self.limiting = Some(LimitingMeter {
            channel: MeterChannel::meter(endpoint, unit),
            config,
        });
        Ok(())
    }

    pub fn clear_limiting_meter(&mut self) {
        self.limiting = None;
    }

    /// Both generator and meter are present.
    pub fn is_configured(&self) -> bool {
        self.generator.is_some() && self.meter.is_some()
    }

    pub fn limiting_meter_enabled(&self) -> bool {
        self.limiting.is_some()
    }

    pub fn generator(&self) -> Option<&GeneratorChannel> {
        self.generator.as_ref()
    }

    pub fn meter(&self) -> Option<&MeterChannel> {
        self.meter.as_ref()
    }

    pub fn limiting_meter(&self) -> Option<&MeterChannel> {
        self.limiting.as_ref().map(|l| &l.channel)
    }

    pub fn limiting_config(&self) -> Option<&LimitingConfig> {
        self.limiting.as_ref().map(|l| &l.config)
    }

    /// Last value accepted by the generator.
    pub fn generator_value(&self) -> Option<f64> {
        self.generator.as_ref().and_then(|g| g.latest())
    }

    /// Last meter reading.
    pub fn meter_value(&self) -> Option<f64> {
        self.meter.as_ref().and_then(|m| m.latest())
    }

    pub fn state(&self) -> RegulationState {
        self.state
    }

    /// Index of the step the last run stopped at.
    pub fn step_counter(&self) -> usize {
        self.step_counter
    }

    /// Primary method chosen by the last run.
    pub fn method(&self) -> Option<LinearizationMethod> {
        self.method
    }

    pub fn limiting_method(&self) -> Option<LinearizationMethod> {
        self.limiting.as_ref().map(|l| l.config.method)
    }

    /// Clear every channel history and return to idle.
    pub fn reset(&mut self) {
        if let Some(generator) = self.generator.as_mut() {
            generator.reset();
        }
        if let Some(meter) = self.meter.as_mut() {
            meter.reset();
        }
        if let Some(limiting) = self.limiting.as_mut() {
            limiting.channel.reset();
        }
        self.step_counter = 0;
        self.state = RegulationState::Idle;
    }

    /// Write the configured safe-start value to the generator.
    pub fn set_safestart_value(&mut self) -> RegulationResult<()> {
        let value = self.config.safe_start_value;
        let generator = self
            .generator
            .as_mut()
            .ok_or(RegulationError::Configuration {
                what: "generator is not configured",
            })?;
        if generator.write(value) {
            Ok(())
        } else {
            Err(RegulationError::io(
                ChannelRole::Generator,
                "safe-start write was declined",
            ))
        }
    }

    /// Regulate to `target`. `Ok(false)` means the steps ran out.
    pub fn set_regulated_value(&mut self, target: f64) -> RegulationResult<bool> {
        self.regulate(target).map(|report| report.converged())
    }

    /// Regulate to `target` and report how the run ended.
    pub fn regulate(&mut self, target: f64) -> RegulationResult<RegulationReport> {
        let (Some(generator), Some(meter)) = (&self.generator, &self.meter) else {
            return Err(RegulationError::Configuration {
                what: NOT_CONFIGURED,
            });
        };
        self.config.validate()?;
        ensure_finite(target, "target")?;

        let method = self
            .config
            .method
            .unwrap_or_else(|| detect_method(generator.unit_type(), meter.unit_type()));
        info!(
            setpoint = target,
            %method,
            generator_unit = %generator.unit(),
            meter_unit = %meter.unit(),
            "starting regulation"
        );

        self.method = Some(method);
        self.reset();
        self.state = RegulationState::Running;

        let result = self.run(target, method);
        self.state = match &result {
            Ok(report) if report.converged() => RegulationState::Converged,
            Ok(_) => RegulationState::Exhausted,
            Err(_) => RegulationState::Failed,
        };
        result
    }

    fn run(
        &mut self,
        target: f64,
        method: LinearizationMethod,
    ) -> RegulationResult<RegulationReport> {
        let config = &self.config;
        let (Some(generator), Some(meter)) = (self.generator.as_mut(), self.meter.as_mut()) else {
            return Err(RegulationError::Configuration {
                what: NOT_CONFIGURED,
            });
        };
        let mut limiting = self.limiting.as_mut();
        let delay = &mut self.delay;

        let tolerance = config.tolerance.window(target);
        let limiting_tolerance = limiting
            .as_deref()
            .map(|l| l.config.tolerance.window(l.config.limit));

        let mut found = false;
        let mut steps = 0;

        for step in 0..config.max_steps {
            self.step_counter = step;
            steps = step + 1;

            if generator.is_empty() && !generator.write(config.safe_start_value) {
                warn!(
                    step,
                    value = config.safe_start_value,
                    "generator declined safe-start value"
                );
            }

            let met_value = meter
                .read()
                .ok_or(RegulationError::io(ChannelRole::Meter, "read returned no value"))?;
            let lim_value = match limiting.as_deref_mut() {
                Some(lim) => Some(lim.channel.read().ok_or(RegulationError::io(
                    ChannelRole::LimitingMeter,
                    "read returned no value",
                ))?),
                None => None,
            };

            found = (target - met_value).abs() < tolerance;
            if let (Some(lim), Some(reading), Some(lim_tol)) =
                (limiting.as_deref(), lim_value, limiting_tolerance)
            {
                if reading > lim.config.limit {
                    warn!(step, reading, limit = lim.config.limit, "limiting meter above ceiling");
                }
                found = limited_convergence(
                    found,
                    met_value,
                    target,
                    reading,
                    lim.config.limit,
                    lim_tol,
                );
            }
            debug!(step, meter = met_value, limiting = ?lim_value, found, "regulation step");
            if found {
                break;
            }

            let gen_last = generator.last_value().ok_or(RegulationError::io(
                ChannelRole::Generator,
                "no operating point recorded",
            ))?;
            let met_last = meter
                .last_value()
                .ok_or(RegulationError::io(ChannelRole::Meter, "no reading recorded"))?;
            let candidate = estimate_next(method, gen_last, met_last, target)?;
            let mut delta = candidate - gen_last;

            // The limiting model maps the same generator/meter sample onto the limit.
            if let Some(lim) = limiting.as_deref() {
                let lim_candidate =
                    estimate_next(lim.config.method, gen_last, met_last, lim.config.limit)?;
                // Smaller delta wins for either sign, so the ceiling is never overshot.
                let lim_delta = lim_candidate - gen_last;
                if lim_delta < delta {
                    delta = lim_delta;
                }
            }

            let damped = damped_delta(delta, config.conservative_factor, step);
            let applied = clamped_delta(damped, config.max_step_size);
            let next = ensure_finite(gen_last + applied, "generator value")?;
            debug!(step, raw = delta, damped, applied, next, "generator update");

            if !generator.write(next) {
                return Err(RegulationError::io(
                    ChannelRole::Generator,
                    "write was declined",
                ));
            }
            delay.delay_ms(config.settle_ms);
        }

        let outcome = if found {
            info!(steps, generator = ?generator.latest(), "regulation converged");
            RegulationOutcome::Converged
        } else {
            warn!(steps, setpoint = target, "regulation exhausted without meeting tolerance");
            RegulationOutcome::Exhausted
        };

        Ok(RegulationReport {
            outcome,
            steps,
            method,
            limiting_method: limiting.as_deref().map(|l| l.config.method),
            generator: generator.latest(),
            meter: meter.latest(),
            limiting_meter: limiting.as_deref().and_then(|l| l.channel.latest()),
        })
    }
}

/// Reconcile the primary convergence test with the limiting meter.
///
/// A reading above `limit` always vetoes convergence. Otherwise, while the
/// meter is still below target, sitting within `limiting_tolerance` under
/// the limit counts as limit-bound success.
pub fn limited_convergence(
    found: bool,
    met_value: f64,
    target: f64,
    limiting_reading: f64,
    limit: f64,
    limiting_tolerance: f64,
) -> bool {
    if limiting_reading > limit {
        false
    } else if !found && met_value < target {
        (limit - limiting_reading) < limiting_tolerance
    } else {
        found
    }
}

/// Scale `delta` by `1 - factor / (step + 1)`; damping fades as steps grow.
pub fn damped_delta(delta: f64, conservative_factor: f64, step: usize) -> f64 {
    delta * (1.0 - conservative_factor / (step as f64 + 1.0))
}

/// Limit `delta` to `[-max, max]`, keeping its sign.
pub fn clamped_delta(delta: f64, max_step_size: Option<f64>) -> f64 {
    match max_step_size {
        Some(max) if delta > max => max,
        Some(max) if delta < -max => -max,
        _ => delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::NoDelay;
    use crate::signal::{generator_fn, meter_fn};
    use fb_core::Tolerance;

    #[test]
    fn unconfigured_controller_refuses() {
        let mut controller = RegulationController::new();
        let err = controller.set_regulated_value(1.0).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(controller.state(), RegulationState::Idle);

        controller.set_generator(generator_fn(Some), "V");
        assert!(!controller.is_configured());
        assert!(controller.regulate(1.0).unwrap_err().is_configuration());
        assert_eq!(controller.state(), RegulationState::Idle);
    }

    #[test]
    fn safestart_requires_generator() {
        let mut controller = RegulationController::new();
        assert!(controller.set_safestart_value().unwrap_err().is_configuration());
    }

    #[test]
    fn safestart_writes_configured_value() {
        let config = RegulatorConfig::default().with_safe_start(-20.0);
        let mut controller = RegulationController::with_config(config).unwrap();
        controller.set_generator(generator_fn(Some), "dBm");
        controller.set_safestart_value().unwrap();
        assert_eq!(controller.generator_value(), Some(-20.0));

        controller.set_generator(generator_fn(|_| None), "dBm");
        assert!(controller.set_safestart_value().unwrap_err().is_io());
    }

    #[test]
    fn with_config_validates() {
        let config = RegulatorConfig::default().with_conservative_factor(2.0);
        assert!(RegulationController::with_config(config).is_err());
    }

    #[test]
    fn invalid_config_mut_caught_at_run() {
        let mut controller = RegulationController::new().with_delay(NoDelay);
        controller.set_generator(generator_fn(Some), "V");
        controller.set_meter(meter_fn(|| Some(1.0)), "V");
        controller.config_mut().max_step_size = Some(-1.0);
        let err = controller.regulate(1.0).unwrap_err();
        assert!(matches!(err, RegulationError::InvalidArg { .. }));
    }

    #[test]
    fn method_selected_from_units() {
        let config = RegulatorConfig::default().with_tolerance(Tolerance::absolute(0.5));
        let mut controller = RegulationController::with_config(config)
            .unwrap()
            .with_delay(NoDelay);
        controller.set_generator(generator_fn(Some), "W");
        controller.set_meter(meter_fn(|| Some(0.0)), "dBm");
        // Meter already at target.
        assert!(controller.set_regulated_value(0.0).unwrap());
        assert_eq!(controller.method(), Some(LinearizationMethod::PowerToDecibel));
        assert_eq!(controller.state(), RegulationState::Converged);
    }

    #[test]
    fn limiting_meter_setup() {
        let mut controller = RegulationController::new();
        assert!(!controller.limiting_meter_enabled());
        let config = LimitingConfig::new(5.0, Tolerance::absolute(0.1), LinearizationMethod::Offset);
        controller
            .set_limiting_meter(meter_fn(|| Some(1.0)), "A", config)
            .unwrap();
        assert!(controller.limiting_meter_enabled());
        assert_eq!(controller.limiting_method(), Some(LinearizationMethod::Offset));
        controller.clear_limiting_meter();
        assert!(!controller.limiting_meter_enabled());
    }

    #[test]
    fn ceiling_breach_vetoes_convergence() {
        assert!(!limited_convergence(true, 10.0, 10.0, 6.0, 5.0, 0.5));
        assert!(!limited_convergence(false, 8.0, 10.0, 6.0, 5.0, 0.5));
    }

    #[test]
    fn limit_bound_below_target_counts_as_success() {
        assert!(limited_convergence(false, 8.0, 10.0, 4.8, 5.0, 0.5));
        assert!(!limited_convergence(false, 8.0, 10.0, 4.0, 5.0, 0.5));
        // Above target the limit proximity is irrelevant.
        assert!(!limited_convergence(false, 12.0, 10.0, 4.8, 5.0, 0.5));
    }

    #[test]
    fn primary_success_kept_under_ceiling() {
        assert!(limited_convergence(true, 10.0, 10.0, 3.0, 5.0, 0.5));
    }

    #[test]
    fn damping_decays_with_step() {
        assert_eq!(damped_delta(8.0, 0.5, 0), 4.0);
        assert_eq!(damped_delta(8.0, 0.5, 1), 6.0);
        assert_eq!(damped_delta(8.0, 0.0, 0), 8.0);
        assert_eq!(damped_delta(8.0, 1.0, 0), 0.0);
    }

    #[test]
    fn clamp_preserves_sign() {
        assert_eq!(clamped_delta(7.0, Some(2.0)), 2.0);
        assert_eq!(clamped_delta(-7.0, Some(2.0)), -2.0);
        assert_eq!(clamped_delta(1.5, Some(2.0)), 1.5);
        assert_eq!(clamped_delta(-70.0, None), -70.0);
    }
}
