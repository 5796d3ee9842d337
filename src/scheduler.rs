//! Tick scheduler.
//!
//! Drives the sample → derive → evaluate → fan-out cycle at a fixed
//! period.  The scheduler knows nothing about sensors or sinks: it calls
//! a [`TickDelegate`] once per period and then blocks on an
//! [`embedded_hal::delay::DelayNs`] for the remainder.
//!
//! ```text
//!   ┌──────────┐  on_tick(n)  ┌────────────────┐
//!   │ Scheduler│ ───────────▶ │ TickDelegate   │  (main: MonitorService::tick)
//!   └────┬─────┘              └────────────────┘
//!        │ delay_ms(period | period - work)
//!        ▼
//!     DelayNs
//! ```
//!
//! Two spacing policies ([`TickMode`]):
//!
//! - **FixedDelay** sleeps the whole period after the work finishes.
//! - **FixedRate** sleeps `period - work`, saturating at zero.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ClockPort, EventSink, TickDelegate};
use crate::config::{SystemConfig, TickMode};

/// Timing record for one executed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTiming {
    pub tick: u64,
    /// Wall time spent in the delegate.
    pub elapsed_ms: u64,
    /// Time handed to the delay afterwards.
    pub slept_ms: u32,
    /// Work exceeded the period.
    pub overrun: bool,
}

/// Periodic tick driver.
pub struct TickScheduler {
    period_ms: u32,
    mode: TickMode,
    ticks: u64,
    overruns: u64,
}

impl TickScheduler {
    pub fn new(period_ms: u32, mode: TickMode) -> Self {
        Self {
            period_ms,
            mode,
            ticks: 0,
            overruns: 0,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.tick_interval_ms, config.tick_mode)
    }

    /// How long to sleep after a tick whose work took `elapsed_ms`.
    pub fn delay_after(&self, elapsed_ms: u64) -> u32 {
        match self.mode {
            TickMode::FixedDelay => self.period_ms,
            TickMode::FixedRate => {
                let elapsed = u32::try_from(elapsed_ms).unwrap_or(u32::MAX);
                self.period_ms.saturating_sub(elapsed)
            }
        }
    }

    /// Run exactly one tick: call the delegate, then sleep.
    pub fn run_once(
        &mut self,
        delegate: &mut impl TickDelegate,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> TickTiming {
        self.ticks += 1;
        let tick = self.ticks;

        let start = clock.now_ms();
        delegate.on_tick(tick);
        let elapsed_ms = clock.now_ms().saturating_sub(start);

        let overrun = elapsed_ms > u64::from(self.period_ms);
        if overrun {
            self.overruns += 1;
            warn!(
                "Scheduler: tick {} took {} ms (period {} ms)",
                tick, elapsed_ms, self.period_ms
            );
            sink.emit(&AppEvent::TickOverrun { tick, elapsed_ms });
        }

        let slept_ms = self.delay_after(elapsed_ms);
        if slept_ms > 0 {
            delay.delay_ms(slept_ms);
        }

        TickTiming {
            tick,
            elapsed_ms,
            slept_ms,
            overrun,
        }
    }

    /// Tick forever.  There is no shutdown path.
    pub fn run_forever(
        &mut self,
        delegate: &mut impl TickDelegate,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> ! {
        info!(
            "Scheduler: {} ms period, {:?}",
            self.period_ms, self.mode
        );
        loop {
            self.run_once(delegate, clock, delay, sink);
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn mode(&self) -> TickMode {
        self.mode
    }

    /// Ticks executed since construction.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Ticks whose work exceeded the period.
    pub fn overrun_count(&self) -> u64 {
        self.overruns
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
