//! Integration tests for the MonitorService tick pipeline.
//!
//! Drives full ticks (read → fan → evaluate → display → fan-out) against
//! the recording mocks and checks what every sink saw.

use envmon::alerts::AlertKind;
use envmon::app::connection::ConnectionState;
use envmon::app::events::AppEvent;
use envmon::app::ports::{ReportError, ReportStatus};
use envmon::app::service::{MonitorService, TickReport};
use envmon::app::snapshot::SensorSnapshot;
use envmon::config::SystemConfig;
use envmon::fanout::Fanout;

use crate::mock_hw::{nominal, ActuatorCall, LogSink, MockDisplay, MockHardware, MockNotify, MockReporter};

struct Rig {
    service: MonitorService,
    hw: MockHardware,
    screen: MockDisplay,
    ble: MockNotify,
    remote: MockReporter,
    sink: LogSink,
}

impl Rig {
    fn new(snapshot: SensorSnapshot) -> Self {
        Self {
            service: MonitorService::new(&SystemConfig::default()),
            hw: MockHardware::new(snapshot),
            screen: MockDisplay::default(),
            ble: MockNotify::default(),
            remote: MockReporter::new(),
            sink: LogSink::new(),
        }
    }

    fn tick(&mut self, connection: &ConnectionState) -> TickReport {
        let config = SystemConfig::default();
        let fanout = Fanout::new(connection, config.buzzer_freq_hz, config.buzzer_duration_ms);
        self.service.tick(
            &mut self.hw,
            &mut self.screen,
            &fanout,
            &mut self.ble,
            &mut self.remote,
            &mut self.sink,
        )
    }
}

fn connected() -> ConnectionState {
    let c = ConnectionState::new();
    c.set_connected(true);
    c
}

// ── Scenario A: no touch parks the fan ───────────────────────

#[test]
fn no_touch_parks_fan_and_shows_off() {
    let mut rig = Rig::new(nominal());
    let report = rig.tick(&connected());

    assert_eq!(report.touch_count, 0);
    assert_eq!(report.fan_angle, 90);
    assert_eq!(rig.hw.fan_angles(), vec![90]);
    assert_eq!(rig.screen.screen_text()[0], "Fan lvl: off");
}

// ── Scenario B: four touches ──────────────────────────────────

#[test]
fn four_touches_rounds_to_77_degrees() {
    let mut rig = Rig::new(SensorSnapshot {
        touch_mask: 0b0000_1111,
        ..nominal()
    });
    let report = rig.tick(&connected());

    assert_eq!(report.touch_count, 4);
    assert_eq!(report.fan_angle, 77);
    assert_eq!(rig.screen.screen_text()[0], "Fan lvl: 4");
    assert!(report.telemetry.as_str().starts_with("Fan-lvl:4,"));
}

// ── Scenario C: low temperature ───────────────────────────────

#[test]
fn low_temperature_alert_reaches_every_sink() {
    let mut rig = Rig::new(SensorSnapshot {
        temperature_c: 3.0,
        humidity_pct: 50.0,
        accel_x: 0.0,
        accel_y: 0.0,
        accel_z: 1.0,
        light_level: 500,
        ..nominal()
    });
    let report = rig.tick(&connected());

    assert_eq!(report.alert.kind(), Some(AlertKind::LowTemperature));
    let telemetry = report.telemetry.as_str().to_owned();
    assert_eq!(
        rig.ble.payloads,
        vec![telemetry.clone(), "ALERT: Low temperature!".to_owned()]
    );
    assert_eq!(
        rig.remote.reports,
        vec![
            (ReportStatus::Routine, telemetry),
            (ReportStatus::Alert, "Low temperature!".to_owned()),
        ]
    );
    assert_eq!(rig.hw.alarms(), vec![(300, 1000)]);
    assert!(report.fanout.alarm);
}

// ── Scenario D: X-axis motion ─────────────────────────────────

#[test]
fn x_axis_motion_alert() {
    let mut rig = Rig::new(SensorSnapshot {
        temperature_c: 20.0,
        humidity_pct: 50.0,
        accel_x: 0.5,
        accel_y: 0.0,
        accel_z: 1.0,
        light_level: 500,
        ..nominal()
    });
    let report = rig.tick(&connected());

    assert_eq!(report.alert.detail(), "Abnormal X-axis motion!");
    assert_eq!(
        rig.remote.reports.last(),
        Some(&(ReportStatus::Alert, "Abnormal X-axis motion!".to_owned()))
    );
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::AlertRaised(AlertKind::AbnormalX))),
        1
    );
}

// ── Scenario E: nominal tick ──────────────────────────────────

#[test]
fn nominal_tick_sends_only_routine_report() {
    let mut rig = Rig::new(nominal());
    let report = rig.tick(&connected());

    assert!(!report.alert.triggered());
    assert_eq!(rig.remote.reports.len(), 1);
    assert_eq!(rig.remote.reports[0].0, ReportStatus::Routine);
    assert_eq!(
        rig.remote.reports[0].1,
        "Fan-lvl:0,LDR:512,Temp:21.37,Hum:48.20,X:0.01,Y:-0.02,Z:0.98"
    );
    assert_eq!(rig.ble.payloads.len(), 1);
    assert!(rig.hw.alarms().is_empty());
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::AlertRaised(_))),
        0
    );
}

// ── Disconnected central ──────────────────────────────────────

#[test]
fn disconnected_central_skips_notify_but_still_reports() {
    let mut rig = Rig::new(SensorSnapshot {
        light_level: 10,
        ..nominal()
    });
    let report = rig.tick(&ConnectionState::new());

    assert!(rig.ble.payloads.is_empty());
    assert_eq!(report.fanout.notified, 0);
    assert_eq!(rig.remote.reports.len(), 2);
    assert_eq!(rig.hw.alarms().len(), 1);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::NotifySkipped)), 2);
}

// ── Remote failures ───────────────────────────────────────────

#[test]
fn connect_failure_is_logged_and_never_retried() {
    let mut rig = Rig::new(SensorSnapshot {
        humidity_pct: 1.0,
        ..nominal()
    });
    rig.remote = MockReporter::failing(ReportError::Connect);
    let report = rig.tick(&connected());

    // One routine, one alert; no retries, and the buzzer still fires.
    assert_eq!(rig.remote.reports.len(), 2);
    assert_eq!(rig.hw.alarms().len(), 1);
    assert!(report
        .fanout
        .reports
        .iter()
        .all(|a| a.result == Err(ReportError::Connect)));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::ReportFailed { .. })),
        2
    );
}

#[test]
fn failure_does_not_carry_into_next_tick() {
    let mut rig = Rig::new(nominal());
    rig.remote = MockReporter::failing(ReportError::Timeout);
    rig.tick(&connected());
    rig.remote.fail_with = None;
    let report = rig.tick(&connected());

    assert_eq!(report.tick, 2);
    assert_eq!(report.fanout.reports[0].result, Ok(200));
}

// ── Ordering ──────────────────────────────────────────────────

#[test]
fn actuation_precedes_display_and_fanout() {
    let mut rig = Rig::new(nominal());
    rig.tick(&connected());

    // poll (end any tone) → fan → (alarm only on alert)
    assert_eq!(rig.hw.calls, vec![ActuatorCall::Poll, ActuatorCall::SetFanAngle(90)]);
    assert_eq!(rig.hw.reads, 1);
    assert!(matches!(rig.sink.events.last(), Some(AppEvent::TickCompleted(_))));
}

#[test]
fn display_repaints_every_tick() {
    let mut rig = Rig::new(nominal());
    for _ in 0..3 {
        rig.tick(&connected());
    }
    assert_eq!(rig.service.tick_count(), 3);
    let clears = rig
        .screen
        .ops
        .iter()
        .filter(|op| matches!(op, crate::mock_hw::DisplayOp::Clear(_)))
        .count();
    assert_eq!(clears, 3);
    assert_eq!(rig.screen.screen_text().len(), 7);
}
