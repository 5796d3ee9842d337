//! Mock adapters for integration tests.
//!
//! Records every actuator, display, notify and report call so tests can
//! assert on the full command history without touching real peripherals.

use embedded_graphics::pixelcolor::Rgb565;
use envmon::app::events::AppEvent;
use envmon::app::ports::{
    ActuatorPort, DisplayPort, EventSink, NotifyPort, ReportError, ReportPort, ReportStatus,
    SensorPort,
};
use envmon::app::snapshot::SensorSnapshot;

// ── Fixtures ──────────────────────────────────────────────────

/// Readings that trip no alert rule.
pub fn nominal() -> SensorSnapshot {
    SensorSnapshot {
        touch_mask: 0,
        light_level: 512,
        temperature_c: 21.37,
        humidity_pct: 48.2,
        accel_x: 0.01,
        accel_y: -0.02,
        accel_z: 0.98,
    }
}

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    SetFanAngle(u8),
    SoundAlarm { freq_hz: u32, duration_ms: u32 },
    Poll,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub snapshot: SensorSnapshot,
    pub calls: Vec<ActuatorCall>,
    pub reads: u32,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(snapshot: SensorSnapshot) -> Self {
        Self {
            snapshot,
            calls: Vec::new(),
            reads: 0,
        }
    }

    pub fn fan_angles(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::SetFanAngle(a) => Some(*a),
                _ => None,
            })
            .collect()
    }

    pub fn alarms(&self) -> Vec<(u32, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::SoundAlarm { freq_hz, duration_ms } => Some((*freq_hz, *duration_ms)),
                _ => None,
            })
            .collect()
    }
}

impl SensorPort for MockHardware {
    fn read_all(&mut self) -> SensorSnapshot {
        self.reads += 1;
        self.snapshot
    }
}

impl ActuatorPort for MockHardware {
    fn set_fan_angle(&mut self, degrees: u8) {
        self.calls.push(ActuatorCall::SetFanAngle(degrees));
    }

    fn sound_alarm(&mut self, freq_hz: u32, duration_ms: u32) {
        self.calls.push(ActuatorCall::SoundAlarm { freq_hz, duration_ms });
    }

    fn poll(&mut self) {
        self.calls.push(ActuatorCall::Poll);
    }
}

// ── MockDisplay ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayOp {
    Clear(Rgb565),
    Cursor(i32, i32),
    Print(String),
    Flush,
}

#[derive(Default)]
pub struct MockDisplay {
    pub ops: Vec<DisplayOp>,
}

#[allow(dead_code)]
impl MockDisplay {
    /// Text printed since the last clear.
    pub fn screen_text(&self) -> Vec<String> {
        let start = self
            .ops
            .iter()
            .rposition(|op| matches!(op, DisplayOp::Clear(_)))
            .map_or(0, |i| i + 1);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                DisplayOp::Print(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DisplayPort for MockDisplay {
    fn clear(&mut self, color: Rgb565) {
        self.ops.push(DisplayOp::Clear(color));
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.ops.push(DisplayOp::Cursor(x, y));
    }

    fn print(&mut self, text: &str) {
        self.ops.push(DisplayOp::Print(text.to_owned()));
    }

    fn flush(&mut self) {
        self.ops.push(DisplayOp::Flush);
    }
}

// ── MockNotify ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNotify {
    pub payloads: Vec<String>,
}

impl NotifyPort for MockNotify {
    fn notify(&mut self, payload: &str) {
        self.payloads.push(payload.to_owned());
    }
}

// ── MockReporter ──────────────────────────────────────────────

pub struct MockReporter {
    pub reports: Vec<(ReportStatus, String)>,
    /// Returned for every call when set; otherwise `Ok(200)`.
    pub fail_with: Option<ReportError>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self {
            reports: Vec::new(),
            fail_with: None,
        }
    }

    pub fn failing(error: ReportError) -> Self {
        Self {
            reports: Vec::new(),
            fail_with: Some(error),
        }
    }
}

impl Default for MockReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for MockReporter {
    fn report(&mut self, status: ReportStatus, info: &str) -> Result<u16, ReportError> {
        self.reports.push((status, info.to_owned()));
        match self.fail_with {
            Some(e) => Err(e),
            None => Ok(200),
        }
    }
}

// ── LogSink ───────────────────────────────────────────────────

pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
