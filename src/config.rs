//! System configuration parameters
//!
//! All tunable parameters for the environmental monitor.
//! Values can be overridden via NVS (non-volatile storage); see
//! [`NvsAdapter`](crate::adapters::nvs::NvsAdapter).

use serde::{Deserialize, Serialize};

/// How the tick scheduler spaces consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TickMode {
    /// Sleep the full interval after each tick's work (work time adds drift).
    #[default]
    FixedDelay,
    /// Subtract the tick's work time from the interval (no drift unless overrun).
    FixedRate,
}

/// Alert predicate thresholds, evaluated in fixed priority order by
/// [`AlertEvaluator`](crate::alerts::AlertEvaluator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Alert when temperature (°C) drops below this.
    pub min_temperature_c: f64,
    /// Alert when relative humidity (%) drops below this.
    pub min_humidity_pct: f64,
    /// Alert when |accel X| (g) exceeds this.
    pub max_abs_accel_x: f64,
    /// Alert when |accel Y| (g) exceeds this.
    pub max_abs_accel_y: f64,
    /// Alert when accel Z (g) drops below this (device tipped over).
    pub min_accel_z: f64,
    /// Alert when the raw LDR reading drops below this.
    pub min_light_level: u16,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            min_temperature_c: 5.0,
            min_humidity_pct: 5.0,
            max_abs_accel_x: 0.3,
            max_abs_accel_y: 0.3,
            min_accel_z: 0.8,
            min_light_level: 150,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Main loop period (milliseconds)
    pub tick_interval_ms: u32,
    /// Delay policy between ticks
    pub tick_mode: TickMode,

    // --- BLE ---
    /// Advertised GAP device name
    pub ble_device_name: heapless::String<24>,

    // --- Remote telemetry endpoint ---
    pub report_host: heapless::String<64>,
    pub report_port: u16,
    /// Request path, query string is appended by the reporter
    pub report_path: heapless::String<64>,
    /// Per-request network timeout (milliseconds)
    pub report_timeout_ms: u32,

    // --- Alerts ---
    pub thresholds: AlertThresholds,
    /// Buzzer tone frequency on alert (Hz)
    pub buzzer_freq_hz: u32,
    /// Buzzer tone length on alert (milliseconds)
    pub buzzer_duration_ms: u32,

    // --- Actuator ---
    /// Servo angle when no touch channel is active
    pub fan_neutral_angle: u8,

    // --- Network ---
    /// Pause between WiFi join polls (milliseconds)
    pub wifi_join_retry_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_interval_ms: 1000, // 1 Hz
            tick_mode: TickMode::FixedDelay,

            // BLE
            ble_device_name: heapless_str("ESP32_Device"),

            // Remote endpoint
            report_host: heapless_str("18.118.15.226"),
            report_port: 5000,
            report_path: heapless_str("/api/upload"),
            report_timeout_ms: 5000,

            // Alerts
            thresholds: AlertThresholds::default(),
            buzzer_freq_hz: 300,
            buzzer_duration_ms: 1000,

            // Actuator
            fan_neutral_angle: 90,

            // Network
            wifi_join_retry_ms: 500,
        }
    }
}

/// Build a fixed-capacity string from a literal that is known to fit.
fn heapless_str<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
