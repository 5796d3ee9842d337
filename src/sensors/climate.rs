//! AHT20 temperature / relative-humidity sensor (I²C, address 0x38).
//!
//! Each reading triggers a conversion, waits ~80 ms, then reads six
//! bytes: status, 20 bits of humidity, 20 bits of temperature.
//!
//! ```text
//!   RH % = raw_h / 2^20 * 100
//!   T °C = raw_t / 2^20 * 200 - 50
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::info;

use crate::error::SensorError;

pub const ADDRESS: u8 = 0x38;

const CMD_SOFT_RESET: u8 = 0xBA;
const CMD_CALIBRATE: [u8; 3] = [0xBE, 0x08, 0x00];
const CMD_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];

const STATUS_BUSY: u8 = 0x80;
const STATUS_CALIBRATED: u8 = 0x08;

const RESET_MS: u32 = 20;
const CONVERSION_MS: u32 = 80;
const FULL_SCALE: f32 = 1_048_576.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

pub struct ClimateSensor {
    address: u8,
}

impl ClimateSensor {
    pub fn new() -> Self {
        Self { address: ADDRESS }
    }

    /// Soft-reset and calibrate; fails if the calibration bit never sets.
    pub fn init<I: I2c, D: DelayNs>(&mut self, i2c: &mut I, delay: &mut D) -> Result<(), SensorError> {
        i2c.write(self.address, &[CMD_SOFT_RESET]).map_err(|_| SensorError::Bus)?;
        delay.delay_ms(RESET_MS);
        i2c.write(self.address, &CMD_CALIBRATE).map_err(|_| SensorError::Bus)?;
        delay.delay_ms(10);
        let status = self.status(i2c)?;
        if status & STATUS_CALIBRATED == 0 {
            return Err(SensorError::NotResponding);
        }
        info!("climate: AHT20 ready at 0x{:02X}", self.address);
        Ok(())
    }

    pub fn read<I: I2c, D: DelayNs>(&mut self, i2c: &mut I, delay: &mut D) -> Result<ClimateReading, SensorError> {
        i2c.write(self.address, &CMD_TRIGGER).map_err(|_| SensorError::Bus)?;
        delay.delay_ms(CONVERSION_MS);
        let mut buf = [0u8; 6];
        i2c.read(self.address, &mut buf).map_err(|_| SensorError::Bus)?;
        if buf[0] & STATUS_BUSY != 0 {
            return Err(SensorError::Busy);
        }
        Ok(decode(&buf))
    }

    fn status<I: I2c>(&self, i2c: &mut I) -> Result<u8, SensorError> {
        let mut buf = [0u8];
        i2c.read(self.address, &mut buf).map_err(|_| SensorError::Bus)?;
        Ok(buf[0])
    }
}

impl Default for ClimateSensor {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a six-byte measurement frame.
pub fn decode(buf: &[u8; 6]) -> ClimateReading {
    let raw_h = (u32::from(buf[1]) << 12) | (u32::from(buf[2]) << 4) | (u32::from(buf[3]) >> 4);
    let raw_t = ((u32::from(buf[3]) & 0x0F) << 16) | (u32::from(buf[4]) << 8) | u32::from(buf[5]);
    ClimateReading {
        temperature_c: raw_t as f32 / FULL_SCALE * 200.0 - 50.0,
        humidity_pct: raw_h as f32 / FULL_SCALE * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_midscale() {
        // raw_h = 0x80000 (50 %), raw_t = 0x60000 (25 °C)
        let r = decode(&[0x1C, 0x80, 0x00, 0x06, 0x00, 0x00]);
        assert!((r.humidity_pct - 50.0).abs() < 1e-3);
        assert!((r.temperature_c - 25.0).abs() < 1e-3);
    }

    #[test]
    fn decode_zero_frame_is_minus_50() {
        let r = decode(&[0; 6]);
        assert_eq!(r.humidity_pct, 0.0);
        assert_eq!(r.temperature_c, -50.0);
    }
}
