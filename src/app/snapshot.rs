//! Per-tick sensor snapshot shared by every downstream consumer.

/// One complete set of readings, captured before anything consumes it.
///
/// Values are raw driver output: no clamping, calibration or filtering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSnapshot {
    /// Bit `n` set = touch channel `n` active (CAP1188, 8 channels).
    pub touch_mask: u8,
    /// LDR reading in raw 12-bit ADC counts (0–4095).
    pub light_level: u16,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// Acceleration in g.
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
}

impl SensorSnapshot {
    /// Number of active touch channels, 0–8.
    pub fn touch_count(&self) -> u8 {
        crate::control::fan::touch_count(self.touch_mask)
    }
}
