//! Monitor service: the hexagonal core.
//!
//! [`MonitorService`] owns the alert evaluator and the control parameters.
//! All I/O flows through port traits injected at call sites, making the
//! entire tick testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ DisplayPort
//!                 │      MonitorService      │ ──▶ Fanout ──▶ NotifyPort
//! ActuatorPort ◀──│  fan map · alert rules   │            ──▶ ReportPort
//!                 └──────────────────────────┘ ──▶ EventSink
//! ```
//!
//! Data flows one way per tick and nothing but the tick counter survives
//! between ticks.

use log::info;

use crate::alerts::{AlertEvaluator, AlertResult};
use crate::config::SystemConfig;
use crate::control::fan;
use crate::display;
use crate::fanout::{Fanout, FanoutOutcome};
use crate::telemetry::TelemetryMessage;

use super::events::{AppEvent, TickSummary};
use super::ports::{ActuatorPort, DisplayPort, EventSink, NotifyPort, ReportPort, SensorPort};
use super::snapshot::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Tick report
// ───────────────────────────────────────────────────────────────

/// Everything one tick derived and sent, for logging and tests.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub snapshot: SensorSnapshot,
    pub touch_count: u8,
    pub fan_angle: u8,
    pub alert: AlertResult,
    pub telemetry: TelemetryMessage,
    pub fanout: FanoutOutcome,
}

impl TickReport {
    pub fn summary(&self) -> TickSummary {
        TickSummary {
            tick: self.tick,
            touch_count: self.touch_count,
            fan_angle: self.fan_angle,
            light_level: self.snapshot.light_level,
            temperature_c: self.snapshot.temperature_c,
            humidity_pct: self.snapshot.humidity_pct,
            alert: self.alert.kind(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

/// The monitor service orchestrates all domain logic.
pub struct MonitorService {
    evaluator: AlertEvaluator,
    neutral_angle: u8,
    interval_ms: u32,
    tick_count: u64,
}

impl MonitorService {
    /// Construct the service from configuration.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            evaluator: AlertEvaluator::new(config.thresholds),
            neutral_angle: config.fan_neutral_angle,
            interval_ms: config.tick_interval_ms,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            interval_ms: self.interval_ms,
        });
        info!("MonitorService started ({} ms tick)", self.interval_ms);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full cycle: read → actuate → evaluate → render → fan out.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        screen: &mut impl DisplayPort,
        fanout: &Fanout<'_>,
        ble: &mut impl NotifyPort,
        remote: &mut impl ReportPort,
        sink: &mut impl EventSink,
    ) -> TickReport {
        self.tick_count += 1;

        // Let time-based actuators (buzzer) finish anything from last tick.
        hw.poll();

        // 1. Acquire. The snapshot is complete before anyone reads it.
        let snapshot = hw.read_all();
        let touch_count = snapshot.touch_count();

        // 2. Actuator control
        let fan_angle = fan::fan_angle(touch_count, self.neutral_angle);
        hw.set_fan_angle(fan_angle);

        // 3. Alert evaluation (pure)
        let alert = self.evaluator.evaluate(&snapshot);
        if let Some(kind) = alert.kind() {
            sink.emit(&AppEvent::AlertRaised(kind));
        }

        // 4. Display
        display::render_status(screen, touch_count, &snapshot);

        // 5. Fan-out
        let telemetry = TelemetryMessage::encode(touch_count, &snapshot);
        let outcome = fanout.publish(&telemetry, &alert, ble, remote, hw, sink);

        let report = TickReport {
            tick: self.tick_count,
            snapshot,
            touch_count,
            fan_angle,
            alert,
            telemetry,
            fanout: outcome,
        };
        sink.emit(&AppEvent::TickCompleted(report.summary()));
        report
    }

    // ── Queries ───────────────────────────────────────────────

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn evaluator(&self) -> &AlertEvaluator {
        &self.evaluator
    }
}
