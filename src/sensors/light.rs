//! LDR light sensor.
//!
//! A light-dependent resistor in a divider, read as a raw 12-bit ADC
//! count (0 – 4095).  Higher counts mean more light.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH0 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static AtomicU16 for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(not(target_os = "espidf"))]
static SIM_LIGHT_ADC: AtomicU16 = AtomicU16::new(2048);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_light_adc(raw: u16) {
    SIM_LIGHT_ADC.store(raw.min(ADC_MAX), Ordering::Relaxed);
}

pub const ADC_MAX: u16 = 4095;

pub struct LightSensor;

impl LightSensor {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self) -> u16 {
        self.read_adc()
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(pins::LDR_ADC_CHANNEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_LIGHT_ADC.load(Ordering::Relaxed)
    }
}

impl Default for LightSensor {
    fn default() -> Self {
        Self::new()
    }
}
