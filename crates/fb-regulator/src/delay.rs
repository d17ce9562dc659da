//! Settling delay between regulation steps.
//!
//! The regulator waits a fixed time after every generator write so the
//! hardware can settle. The wait is injected so tests can skip it.

use std::time::Duration;

/// Blocking wait primitive.
pub trait Delay {
    fn delay_ms(&mut self, ms: u64);
}

/// Blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Delay for ThreadSleep {
    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn delay_ms(&mut self, _ms: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn thread_sleep_blocks() {
        let start = Instant::now();
        ThreadSleep.delay_ms(5);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn no_delay_returns_immediately() {
        let start = Instant::now();
        NoDelay.delay_ms(10_000);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
