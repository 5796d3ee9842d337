//! Flat text telemetry encoding.
//!
//! One [`TelemetryMessage`] is built per tick and sent byte-for-byte to
//! both the BLE characteristic and the routine HTTP report:
//!
//! ```text
//! Fan-lvl:4,LDR:512,Temp:21.37,Hum:48.20,X:0.01,Y:-0.02,Z:0.98
//! ```
//!
//! Floats carry two decimals. The remote collector splits on `,` then `:`
//! and keys on the labels, so label spelling is part of the wire format.

use core::fmt::{self, Write};

use crate::app::snapshot::SensorSnapshot;

/// Worst case is ~7 labels plus seven `f32::MAX`-width fields; real
/// readings stay well under 100 bytes.
pub const TELEMETRY_CAPACITY: usize = 320;
/// `"ALERT: "` plus the longest alert detail.
pub const ALERT_CAPACITY: usize = 64;

pub const ALERT_PREFIX: &str = "ALERT: ";

/// Encoded per-tick telemetry line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryMessage(heapless::String<TELEMETRY_CAPACITY>);

impl TelemetryMessage {
    /// Encode `snap` together with the derived touch count.
    ///
    /// Pure: identical inputs always yield identical bytes. Output that
    /// would exceed the buffer is truncated.
    pub fn encode(touch_count: u8, snap: &SensorSnapshot) -> Self {
        let mut out = heapless::String::new();
        if write_fields(&mut out, touch_count, snap).is_err() {
            log::warn!("telemetry: line truncated at {} bytes", out.len());
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TelemetryMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn write_fields<W: Write>(out: &mut W, touch_count: u8, s: &SensorSnapshot) -> fmt::Result {
    write!(out, "Fan-lvl:{}", touch_count)?;
    write!(out, ",LDR:{}", s.light_level)?;
    write!(out, ",Temp:{:.2}", s.temperature_c)?;
    write!(out, ",Hum:{:.2}", s.humidity_pct)?;
    write!(out, ",X:{:.2}", s.accel_x)?;
    write!(out, ",Y:{:.2}", s.accel_y)?;
    write!(out, ",Z:{:.2}", s.accel_z)
}

/// Build the BLE alert notification `"ALERT: <detail>"`.
pub fn alert_message(detail: &str) -> heapless::String<ALERT_CAPACITY> {
    let mut out = heapless::String::new();
    let _ = out.push_str(ALERT_PREFIX);
    for ch in detail.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
