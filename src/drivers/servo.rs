//! Hobby-servo driver for the fan-direction vane.
//!
//! 50 Hz LEDC PWM on ch0.  The pulse width maps linearly from
//! [`MIN_PULSE_US`] at 0° to [`MAX_PULSE_US`] at 180°.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the LEDC duty via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::control::fan::MAX_ANGLE;
use crate::drivers::hw_init;
use crate::pins;

pub const MIN_PULSE_US: u32 = 544;
pub const MAX_PULSE_US: u32 = 2400;
const FRAME_US: u32 = 1_000_000 / pins::SERVO_PWM_FREQ_HZ;

/// Pulse width for `degrees`, clamped to 0..=180.
pub fn pulse_us(degrees: u8) -> u32 {
    let deg = u32::from(degrees.min(MAX_ANGLE));
    MIN_PULSE_US + (MAX_PULSE_US - MIN_PULSE_US) * deg / u32::from(MAX_ANGLE)
}

/// LEDC duty count for a pulse at the servo timer resolution.
pub fn duty_for_pulse(pulse_us: u32) -> u32 {
    let max_duty = 1u32 << pins::SERVO_PWM_RESOLUTION_BITS;
    max_duty * pulse_us / FRAME_US
}

pub struct ServoDriver {
    angle: Option<u8>,
    hw_duty: u32,
}

impl ServoDriver {
    pub fn new() -> Self {
        Self {
            angle: None,
            hw_duty: 0,
        }
    }

    /// Command the horn to `degrees` (clamped to 180).
    pub fn write(&mut self, degrees: u8) {
        let degrees = degrees.min(MAX_ANGLE);
        let duty = duty_for_pulse(pulse_us(degrees));
        hw_init::ledc_set(hw_init::LEDC_CH_SERVO, duty);
        self.hw_duty = duty;
        self.angle = Some(degrees);
    }

    /// Last commanded angle; `None` before the first write.
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }

    pub fn current_duty(&self) -> u32 {
        self.hw_duty
    }
}

impl Default for ServoDriver {
    fn default() -> Self {
        Self::new()
    }
}
