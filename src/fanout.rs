//! Notification fan-out: push one tick's telemetry to every sink.
//!
//! Per tick, in order:
//!
//! 1. BLE notify the telemetry line (only while a central is connected).
//! 2. Remote report, status 200, same line.
//! 3. If an alert fired:
//!    - BLE notify `ALERT: <detail>` (again only while connected),
//!    - remote report, status 500, bare detail,
//!    - start the buzzer tone.
//!
//! Every sink is best-effort. Failures are logged through the
//! [`EventSink`] and never retried, and a failure in one sink never
//! suppresses the next.

use log::debug;

use crate::alerts::AlertResult;
use crate::app::connection::ConnectionState;
use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, EventSink, NotifyPort, ReportError, ReportPort, ReportStatus};
use crate::telemetry::{self, TelemetryMessage};

/// Outcome of a single remote report attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportAttempt {
    pub status: ReportStatus,
    pub result: Result<u16, ReportError>,
}

/// What [`Fanout::publish`] actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutOutcome {
    /// BLE payloads handed to the notify port.
    pub notified: u8,
    /// Remote reports in the order they were sent.
    pub reports: heapless::Vec<ReportAttempt, 2>,
    /// Whether the buzzer was started.
    pub alarm: bool,
}

/// Fans telemetry out to BLE, HTTP and the buzzer.
pub struct Fanout<'a> {
    connection: &'a ConnectionState,
    buzzer_freq_hz: u32,
    buzzer_duration_ms: u32,
}

impl<'a> Fanout<'a> {
    pub fn new(connection: &'a ConnectionState, buzzer_freq_hz: u32, buzzer_duration_ms: u32) -> Self {
        Self {
            connection,
            buzzer_freq_hz,
            buzzer_duration_ms,
        }
    }

    pub fn connection(&self) -> &ConnectionState {
        self.connection
    }

    /// Deliver `msg` (and the alert, if any) to every sink.
    pub fn publish(
        &self,
        msg: &TelemetryMessage,
        alert: &AlertResult,
        ble: &mut impl NotifyPort,
        remote: &mut impl ReportPort,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> FanoutOutcome {
        let mut outcome = FanoutOutcome::default();

        if self.notify(ble, msg.as_str(), sink) {
            outcome.notified += 1;
        }
        self.report(remote, ReportStatus::Routine, msg.as_str(), sink, &mut outcome);

        if alert.triggered() {
            let alert_line = telemetry::alert_message(alert.detail());
            if self.notify(ble, &alert_line, sink) {
                outcome.notified += 1;
            }
            self.report(remote, ReportStatus::Alert, alert.detail(), sink, &mut outcome);
            hw.sound_alarm(self.buzzer_freq_hz, self.buzzer_duration_ms);
            outcome.alarm = true;
        }

        outcome
    }

    // ── Internal ──────────────────────────────────────────────

    fn notify(&self, ble: &mut impl NotifyPort, payload: &str, sink: &mut impl EventSink) -> bool {
        if !self.connection.is_connected() {
            sink.emit(&AppEvent::NotifySkipped);
            return false;
        }
        ble.notify(payload);
        debug!("fanout: BLE notified ({} bytes)", payload.len());
        true
    }

    fn report(
        &self,
        remote: &mut impl ReportPort,
        status: ReportStatus,
        info: &str,
        sink: &mut impl EventSink,
        outcome: &mut FanoutOutcome,
    ) {
        let result = remote.report(status, info);
        match result {
            Ok(http_status) => sink.emit(&AppEvent::ReportDelivered { status, http_status }),
            Err(error) => sink.emit(&AppEvent::ReportFailed { status, error }),
        }
        let pushed = outcome.reports.push(ReportAttempt { status, result });
        debug_assert!(pushed.is_ok(), "more than two reports in one publish");
    }
}
