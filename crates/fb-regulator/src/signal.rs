//! Generator and meter endpoints and the channels that record their samples.

use fb_core::{UnitLabel, UnitType};

/// Something the regulator can read a value from.
pub trait Endpoint {
    /// Query the current value. `None` means the endpoint failed.
    fn read(&mut self) -> Option<f64>;
}

/// An endpoint that can also be commanded to a value.
///
/// For a generator, [`Endpoint::read`] is a read-back of the current
/// output. Write-only instruments return `None` there.
pub trait Generator: Endpoint {
    /// Command `value`. Returns a confirmation on success, `None` if the
    /// instrument declined.
    fn write(&mut self, value: f64) -> Option<f64>;
}

impl<E: Endpoint + ?Sized> Endpoint for Box<E> {
    fn read(&mut self) -> Option<f64> {
        (**self).read()
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn write(&mut self, value: f64) -> Option<f64> {
        (**self).write(value)
    }
}

/// Meter backed by a closure.
pub struct FnMeter<F>(F);

/// Build a meter endpoint from a closure.
pub fn meter_fn<F>(f: F) -> FnMeter<F>
where
    F: FnMut() -> Option<f64>,
{
    FnMeter(f)
}

impl<F> Endpoint for FnMeter<F>
where
    F: FnMut() -> Option<f64>,
{
    fn read(&mut self) -> Option<f64> {
        (self.0)()
    }
}

/// Write-only generator backed by a closure.
pub struct FnGenerator<F>(F);

/// Build a generator endpoint from a closure. The closure receives the
/// commanded value and returns a confirmation.
pub fn generator_fn<F>(f: F) -> FnGenerator<F>
where
    F: FnMut(f64) -> Option<f64>,
{
    FnGenerator(f)
}

impl<F> Endpoint for FnGenerator<F>
where
    F: FnMut(f64) -> Option<f64>,
{
    fn read(&mut self) -> Option<f64> {
        None
    }
}

impl<F> Generator for FnGenerator<F>
where
    F: FnMut(f64) -> Option<f64>,
{
    fn write(&mut self, value: f64) -> Option<f64> {
        (self.0)(value)
    }
}

/// Wraps one endpoint and records every accepted sample in insertion order.
///
/// A value only enters the history when the endpoint call succeeds.
pub struct SignalChannel<E: ?Sized> {
    unit: UnitLabel,
    history: Vec<f64>,
    endpoint: Box<E>,
}

/// Channel around a read-only endpoint.
pub type MeterChannel = SignalChannel<dyn Endpoint>;

/// Channel around a commandable endpoint.
pub type GeneratorChannel = SignalChannel<dyn Generator>;

impl MeterChannel {
    pub fn meter(endpoint: impl Endpoint + 'static, unit: impl Into<UnitLabel>) -> Self {
        Self::from_boxed(Box::new(endpoint), unit)
    }
}

impl GeneratorChannel {
    pub fn generator(endpoint: impl Generator + 'static, unit: impl Into<UnitLabel>) -> Self {
        Self::from_boxed(Box::new(endpoint), unit)
    }
}

impl<E: ?Sized> SignalChannel<E> {
    pub fn from_boxed(endpoint: Box<E>, unit: impl Into<UnitLabel>) -> Self {
        Self {
            unit: unit.into(),
            history: Vec::new(),
            endpoint,
        }
    }

    /// Forget all recorded samples.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Recorded samples, oldest first.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Newest recorded sample without touching the endpoint.
    pub fn latest(&self) -> Option<f64> {
        self.history.last().copied()
    }

    pub fn unit(&self) -> &UnitLabel {
        &self.unit
    }

    pub fn unit_type(&self) -> UnitType {
        self.unit.unit_type()
    }
}

impl<E: Endpoint + ?Sized> SignalChannel<E> {
    /// Read the endpoint, recording the value if one came back.
    pub fn read(&mut self) -> Option<f64> {
        let value = self.endpoint.read()?;
        self.history.push(value);
        Some(value)
    }

    /// Newest sample. An empty channel is read first; `None` if that read
    /// fails too.
    pub fn last_value(&mut self) -> Option<f64> {
        if self.history.is_empty() {
            self.read()?;
        }
        self.latest()
    }
}

impl<E: Generator + ?Sized> SignalChannel<E> {
    /// Command `value`, recording it if the endpoint confirmed.
    pub fn write(&mut self, value: f64) -> bool {
        let confirmed = self.endpoint.write(value).is_some();
        if confirmed {
            self.history.push(value);
        }
        confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn read_records_only_successful_values() {
        let mut readings = vec![Some(1.5), None, Some(2.5)].into_iter();
        let mut channel = MeterChannel::meter(meter_fn(move || readings.next().flatten()), "V");

        assert_eq!(channel.read(), Some(1.5));
        assert_eq!(channel.read(), None);
        assert_eq!(channel.read(), Some(2.5));
        assert_eq!(channel.history(), &[1.5, 2.5]);
    }

    #[test]
    fn write_records_confirmed_values() {
        let accept = Rc::new(Cell::new(true));
        let flag = accept.clone();
        let mut channel = GeneratorChannel::generator(
            generator_fn(move |v| flag.get().then_some(v)),
            "dBm",
        );

        assert!(channel.write(-35.0));
        accept.set(false);
        assert!(!channel.write(-30.0));
        assert_eq!(channel.history(), &[-35.0]);
        assert_eq!(channel.unit_type(), UnitType::Logarithmic);
    }

    #[test]
    fn last_value_reads_when_empty() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut channel = MeterChannel::meter(
            meter_fn(move || {
                counter.set(counter.get() + 1);
                Some(4.0)
            }),
            "A",
        );

        assert!(channel.is_empty());
        assert_eq!(channel.last_value(), Some(4.0));
        assert_eq!(channel.last_value(), Some(4.0));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn last_value_fails_on_write_only_generator() {
        let mut channel = GeneratorChannel::generator(generator_fn(Some), "V");
        assert_eq!(channel.last_value(), None);
        assert!(channel.is_empty());
    }

    #[test]
    fn reset_clears_history() {
        let mut channel = MeterChannel::meter(meter_fn(|| Some(1.0)), "V");
        channel.read();
        channel.read();
        channel.reset();
        assert!(channel.is_empty());
        assert_eq!(channel.latest(), None);
    }
}
