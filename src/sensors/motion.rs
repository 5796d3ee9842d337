//! LSM6DSO 6-axis IMU, accelerometer only.
//!
//! Configured for 104 Hz, ±2 g.  Axes are reported in g.
//!
//! The breakout strap (SA0) picks the I²C address: 0x6B when pulled high,
//! which is the board default, or 0x6A when the jumper is cut.  `init`
//! probes both in that order and keeps the one that answers.

use embedded_hal::i2c::I2c;
use log::info;

use crate::error::SensorError;

/// SA0 high (breakout default).
pub const ADDRESS: u8 = 0x6B;
/// SA0 low.
pub const ALT_ADDRESS: u8 = 0x6A;

const REG_WHO_AM_I: u8 = 0x0F;
const REG_CTRL1_XL: u8 = 0x10;
const REG_CTRL3_C: u8 = 0x12;
const REG_OUTX_L_A: u8 = 0x28;

const WHO_AM_I: u8 = 0x6C;
/// ODR 104 Hz, FS ±2 g.
const CTRL1_XL_104HZ_2G: u8 = 0x40;
/// Block data update + register auto-increment.
const CTRL3_C_BDU_IF_INC: u8 = 0x44;

/// ±2 g sensitivity: 0.061 mg/LSB.
const G_PER_LSB: f32 = 0.000_061;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

pub struct MotionSensor {
    address: u8,
}

impl MotionSensor {
    pub fn new() -> Self {
        Self { address: ADDRESS }
    }

    /// Address the device answered on, once `init` has succeeded.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        self.address = match Self::probe(i2c, ADDRESS) {
            Ok(()) => ADDRESS,
            Err(first) => match Self::probe(i2c, ALT_ADDRESS) {
                Ok(()) => ALT_ADDRESS,
                // A NACK on the alternate says nothing new; report the
                // more specific of the two failures.
                Err(SensorError::Bus) => return Err(first),
                Err(e) => return Err(e),
            },
        };
        i2c.write(self.address, &[REG_CTRL3_C, CTRL3_C_BDU_IF_INC]).map_err(|_| SensorError::Bus)?;
        i2c.write(self.address, &[REG_CTRL1_XL, CTRL1_XL_104HZ_2G]).map_err(|_| SensorError::Bus)?;
        info!("motion: LSM6DSO ready at 0x{:02X}", self.address);
        Ok(())
    }

    fn probe<I: I2c>(i2c: &mut I, address: u8) -> Result<(), SensorError> {
        let mut id = [0u8];
        i2c.write_read(address, &[REG_WHO_AM_I], &mut id).map_err(|_| SensorError::Bus)?;
        if id[0] == WHO_AM_I {
            Ok(())
        } else {
            Err(SensorError::NotResponding)
        }
    }

    pub fn read<I: I2c>(&mut self, i2c: &mut I) -> Result<Acceleration, SensorError> {
        let mut buf = [0u8; 6];
        i2c.write_read(self.address, &[REG_OUTX_L_A], &mut buf).map_err(|_| SensorError::Bus)?;
        Ok(decode(&buf))
    }
}

impl Default for MotionSensor {
    fn default() -> Self {
        Self::new()
    }
}

/// Little-endian X/Y/Z words to g.
pub fn decode(buf: &[u8; 6]) -> Acceleration {
    let axis = |i: usize| f32::from(i16::from_le_bytes([buf[i], buf[i + 1]])) * G_PER_LSB;
    Acceleration {
        x: axis(0),
        y: axis(2),
        z: axis(4),
    }
}
