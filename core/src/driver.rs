//! Frame driver
//!
//! One [`FrameDriver::tick`] per display refresh. A failing tick is logged and
//! reported but never stops the driver; the caller keeps scheduling redraws.

use std::time::{Duration, Instant};

use anyhow::Error;

use crate::input::InputState;
use crate::wasm::ModuleInstance;

/// Frame driver tuning
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Ticks slower than this are logged at debug level
    pub budget: Duration,
    /// While a module keeps failing, log only every Nth consecutive failure
    pub failure_log_interval: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            budget: Duration::from_micros(16_667),
            failure_log_interval: 60,
        }
    }
}

/// Outcome of one tick
#[derive(Debug)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    pub elapsed: Duration,
    /// Input state the tick observed
    pub input: InputState,
    /// Whether the module published a frame during the tick
    pub presented: bool,
    pub error: Option<Error>,
}

impl TickReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives the module's tick entry point
#[derive(Debug, Default)]
pub struct FrameDriver {
    config: DriverConfig,
    ticks: u64,
    failures: u64,
    consecutive_failures: u64,
}

impl FrameDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Ticks run so far, failed ones included
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Failed ticks so far
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Run one tick
    ///
    /// Input calls for every event observed so far have already been made, so
    /// `input` is what this tick sees; it is carried into the report.
    pub fn tick(&mut self, instance: &mut ModuleInstance, input: InputState) -> TickReport {
        self.ticks += 1;
        let tick = self.ticks;
        let frames_before = instance.context().frames_presented;

        let start = Instant::now();
        let result = instance.tick(input);
        let elapsed = start.elapsed();

        let presented = instance.context().frames_presented != frames_before;
        if elapsed > self.config.budget {
            tracing::debug!("Tick {} took {:?} (budget {:?})", tick, elapsed, self.config.budget);
        }

        let error = match result {
            Ok(()) => {
                if self.consecutive_failures > 0 {
                    tracing::info!(
                        "Module recovered at tick {} after {} failed ticks",
                        tick,
                        self.consecutive_failures
                    );
                    self.consecutive_failures = 0;
                }
                None
            }
            Err(e) => {
                let e = e.context(format!("tick {}", tick));
                self.failures += 1;
                self.consecutive_failures += 1;
                let interval = self.config.failure_log_interval.max(1);
                if self.consecutive_failures == 1 || self.consecutive_failures % interval == 0 {
                    tracing::error!(
                        "Module tick failed ({} consecutive): {:#}",
                        self.consecutive_failures,
                        e
                    );
                }
                Some(e)
            }
        };

        TickReport {
            tick,
            elapsed,
            input,
            presented,
            error,
        }
    }
}
