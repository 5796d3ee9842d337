//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) and the
//! [`Fanout`](crate::fanout::Fanout) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log today).

use crate::alerts::AlertKind;

use super::ports::{ReportError, ReportStatus};

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The tick loop is about to start.
    Started { interval_ms: u32 },

    /// One tick finished; carries the values that went out.
    TickCompleted(TickSummary),

    /// An alert rule fired this tick.
    AlertRaised(AlertKind),

    /// BLE notify skipped because no central is connected.
    NotifySkipped,

    /// The remote endpoint answered.
    ReportDelivered { status: ReportStatus, http_status: u16 },

    /// The remote endpoint could not be reached.  Never retried.
    ReportFailed { status: ReportStatus, error: ReportError },

    /// A tick's work took longer than the configured period.
    TickOverrun { tick: u64, elapsed_ms: u64 },
}

/// Per-tick summary suitable for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummary {
    pub tick: u64,
    pub touch_count: u8,
    pub fan_angle: u8,
    pub light_level: u16,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub alert: Option<AlertKind>,
}
