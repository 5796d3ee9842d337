//! CAP1188 8-channel capacitive touch controller (I²C, address 0x29).
//!
//! One status byte, one bit per pad.  The controller latches touches and
//! raises INT until the INT bit in MAIN_CONTROL is cleared, so every read
//! clears it to re-arm the next sample.

use embedded_hal::i2c::I2c;
use log::info;

use crate::error::SensorError;

pub const ADDRESS: u8 = 0x29;

const REG_MAIN_CONTROL: u8 = 0x00;
const REG_INPUT_STATUS: u8 = 0x03;
const REG_MULTI_TOUCH: u8 = 0x2A;
const REG_STANDBY_CONFIG: u8 = 0x41;
const REG_LED_LINK: u8 = 0x72;
const REG_PRODUCT_ID: u8 = 0xFD;

const PRODUCT_ID: u8 = 0x50;
const MAIN_INT: u8 = 0x01;

pub struct TouchSensor {
    address: u8,
}

impl TouchSensor {
    pub fn new() -> Self {
        Self { address: ADDRESS }
    }

    /// Probe the product ID and configure multi-touch.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        let pid = read_reg(i2c, self.address, REG_PRODUCT_ID)?;
        if pid != PRODUCT_ID {
            return Err(SensorError::NotResponding);
        }
        // Report every pad, not just the first one touched.
        write_reg(i2c, self.address, REG_MULTI_TOUCH, 0x00)?;
        // Pad LEDs follow touches.
        write_reg(i2c, self.address, REG_LED_LINK, 0xFF)?;
        write_reg(i2c, self.address, REG_STANDBY_CONFIG, 0x30)?;
        info!("touch: CAP1188 ready at 0x{:02X}", self.address);
        Ok(())
    }

    /// Current pad bitmask (bit i = pad i+1 touched).
    pub fn read<I: I2c>(&mut self, i2c: &mut I) -> Result<u8, SensorError> {
        let mask = read_reg(i2c, self.address, REG_INPUT_STATUS)?;
        if mask != 0 {
            let main = read_reg(i2c, self.address, REG_MAIN_CONTROL)?;
            write_reg(i2c, self.address, REG_MAIN_CONTROL, main & !MAIN_INT)?;
        }
        Ok(mask)
    }
}

impl Default for TouchSensor {
    fn default() -> Self {
        Self::new()
    }
}

fn read_reg<I: I2c>(i2c: &mut I, addr: u8, reg: u8) -> Result<u8, SensorError> {
    let mut buf = [0u8];
    i2c.write_read(addr, &[reg], &mut buf).map_err(|_| SensorError::Bus)?;
    Ok(buf[0])
}

fn write_reg<I: I2c>(i2c: &mut I, addr: u8, reg: u8, value: u8) -> Result<(), SensorError> {
    i2c.write(addr, &[reg, value]).map_err(|_| SensorError::Bus)
}
