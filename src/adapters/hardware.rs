//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and both actuator drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  On non-espidf targets
//! the underlying drivers use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::app::ports::{ActuatorPort, ClockPort, SensorPort};
use crate::app::snapshot::SensorSnapshot;
use crate::drivers::buzzer::BuzzerDriver;
use crate::drivers::servo::ServoDriver;
use crate::sensors::SensorHub;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I, D, C> {
    sensor_hub: SensorHub<I, D>,
    servo: ServoDriver,
    buzzer: BuzzerDriver,
    clock: C,
}

impl<I: I2c, D: DelayNs, C: ClockPort> HardwareAdapter<I, D, C> {
    pub fn new(sensor_hub: SensorHub<I, D>, servo: ServoDriver, buzzer: BuzzerDriver, clock: C) -> Self {
        Self {
            sensor_hub,
            servo,
            buzzer,
            clock,
        }
    }

    pub fn servo(&self) -> &ServoDriver {
        &self.servo
    }

    pub fn buzzer(&self) -> &BuzzerDriver {
        &self.buzzer
    }

    /// Whether the buzzer output is driven right now.
    pub fn buzzer_sounding(&self) -> bool {
        self.buzzer.is_sounding_at(self.clock.now_ms())
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I: I2c, D: DelayNs, C: ClockPort> SensorPort for HardwareAdapter<I, D, C> {
    fn read_all(&mut self) -> SensorSnapshot {
        self.sensor_hub.read_all()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I: I2c, D: DelayNs, C: ClockPort> ActuatorPort for HardwareAdapter<I, D, C> {
    fn set_fan_angle(&mut self, degrees: u8) {
        self.servo.write(degrees);
    }

    fn sound_alarm(&mut self, freq_hz: u32, duration_ms: u32) {
        self.buzzer.start(freq_hz, duration_ms, self.clock.now_ms());
    }

    fn poll(&mut self) {
        self.buzzer.poll(self.clock.now_ms());
    }
}
