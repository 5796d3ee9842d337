//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns the I²C bus and a delay, holds every sensor driver, and
//! produces a [`SensorSnapshot`] each tick.

pub mod climate;
pub mod light;
pub mod motion;
pub mod touch;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::snapshot::SensorSnapshot;
use crate::error::{Error, Result};
use climate::ClimateSensor;
use light::LightSensor;
use motion::MotionSensor;
use touch::TouchSensor;

/// Aggregates all sensor drivers and produces a unified snapshot.
pub struct SensorHub<I, D> {
    i2c: I,
    delay: D,
    pub touch: TouchSensor,
    pub climate: ClimateSensor,
    pub motion: MotionSensor,
    pub light: LightSensor,
    /// Last good values, returned for any field whose read fails.
    last: SensorSnapshot,
}

impl<I: I2c, D: DelayNs> SensorHub<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            i2c,
            delay,
            touch: TouchSensor::new(),
            climate: ClimateSensor::new(),
            motion: MotionSensor::new(),
            light: LightSensor::new(),
            last: SensorSnapshot::default(),
        }
    }

    /// Bring up the three I²C devices.  Any failure is fatal to boot.
    pub fn init(&mut self) -> Result<()> {
        self.climate
            .init(&mut self.i2c, &mut self.delay)
            .map_err(|cause| Error::Init { device: "AHT20", cause })?;
        self.motion
            .init(&mut self.i2c)
            .map_err(|cause| Error::Init { device: "LSM6DSO", cause })?;
        self.touch
            .init(&mut self.i2c)
            .map_err(|cause| Error::Init { device: "CAP1188", cause })?;
        Ok(())
    }

    /// Read every sensor and return a unified snapshot.
    ///
    /// Individual read failures are logged and the previous good value is
    /// retained so a single flaky sensor never stalls the tick.
    pub fn read_all(&mut self) -> SensorSnapshot {
        let mut snap = self.last;

        match self.touch.read(&mut self.i2c) {
            Ok(mask) => snap.touch_mask = mask,
            Err(e) => warn!("sensors: touch read failed: {}", e),
        }

        snap.light_level = self.light.read();

        match self.climate.read(&mut self.i2c, &mut self.delay) {
            Ok(c) => {
                snap.temperature_c = c.temperature_c;
                snap.humidity_pct = c.humidity_pct;
            }
            Err(e) => warn!("sensors: climate read failed: {}", e),
        }

        match self.motion.read(&mut self.i2c) {
            Ok(a) => {
                snap.accel_x = a.x;
                snap.accel_y = a.y;
                snap.accel_z = a.z;
            }
            Err(e) => warn!("sensors: accel read failed: {}", e),
        }

        self.last = snap;
        snap
    }
}
