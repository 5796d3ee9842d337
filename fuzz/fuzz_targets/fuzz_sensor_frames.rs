//! Fuzz target: raw sensor frames through the whole per-tick pipeline
//!
//! Decodes arbitrary AHT20 and LSM6DSO frames, builds a snapshot and runs
//! it through fan mapping, alert evaluation, telemetry encoding and the
//! status screen text.
//!
//! Invariants checked:
//! - No panics under any byte sequence (NaN and infinities included)
//! - Fan angle never exceeds 180°
//! - Telemetry always starts with the touch-count field and fits its buffer
//! - At most one alert per snapshot, and it is the first matching rule
//!
//! cargo fuzz run fuzz_sensor_frames

#![no_main]

use envmon::alerts::{AlertEvaluator, AlertKind};
use envmon::app::snapshot::SensorSnapshot;
use envmon::config::AlertThresholds;
use envmon::control::fan::{self, NEUTRAL_ANGLE};
use envmon::display;
use envmon::sensors::{climate, motion};
use envmon::telemetry::{TelemetryMessage, TELEMETRY_CAPACITY};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 15 {
        return;
    }

    let mut aht = [0u8; 6];
    aht.copy_from_slice(&data[0..6]);
    let mut imu = [0u8; 6];
    imu.copy_from_slice(&data[6..12]);
    let touch_mask = data[12];
    let light_level = u16::from_le_bytes([data[13], data[14]]) & 0x0FFF;

    let climate = climate::decode(&aht);
    let accel = motion::decode(&imu);
    let snap = SensorSnapshot {
        touch_mask,
        light_level,
        temperature_c: climate.temperature_c,
        humidity_pct: climate.humidity_pct,
        accel_x: accel.x,
        accel_y: accel.y,
        accel_z: accel.z,
    };

    let count = snap.touch_count();
    assert!(count <= 8);
    assert!(fan::fan_angle(count, NEUTRAL_ANGLE) <= 180);

    let thresholds = AlertThresholds::default();
    let result = AlertEvaluator::new(thresholds).evaluate(&snap);
    if let Some(kind) = result.kind() {
        assert!(kind.matches(&snap, &thresholds));
        for earlier in AlertKind::ALL.iter().take_while(|k| **k != kind) {
            assert!(!earlier.matches(&snap, &thresholds));
        }
    }

    let msg = TelemetryMessage::encode(count, &snap);
    assert!(msg.len() <= TELEMETRY_CAPACITY);
    assert!(msg.as_str().starts_with("Fan-lvl:"));

    let _ = display::status_lines(count, &snap);
});
