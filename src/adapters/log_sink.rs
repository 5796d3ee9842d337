//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { interval_ms } => {
                info!("START | tick={}ms", interval_ms);
            }
            AppEvent::TickCompleted(t) => {
                info!(
                    "TICK  | #{} | touch={} fan={}\u{00b0} | LDR={} | \
                     T={:.1}\u{00b0}C H={:.1}% | alert={}",
                    t.tick,
                    t.touch_count,
                    t.fan_angle,
                    t.light_level,
                    t.temperature_c,
                    t.humidity_pct,
                    t.alert.map_or("none", |k| k.message()),
                );
            }
            AppEvent::AlertRaised(kind) => {
                warn!("ALERT | {}", kind.message());
            }
            AppEvent::NotifySkipped => {
                log::debug!("BLE   | no central, notify skipped");
            }
            AppEvent::ReportDelivered { status, http_status } => {
                if *http_status >= 400 {
                    error!("HTTP  | {} -> status {}", status.code(), http_status);
                } else {
                    info!("HTTP  | {} -> status {}", status.code(), http_status);
                }
            }
            AppEvent::ReportFailed { status, error } => {
                warn!("HTTP  | {} -> Connection failed: {}", status.code(), error);
            }
            AppEvent::TickOverrun { tick, elapsed_ms } => {
                warn!("SCHED | tick {} overran ({} ms)", tick, elapsed_ms);
            }
        }
    }
}
