//! Unified error types for the environmental monitor firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the boot sequence's error handling uniform. All variants are `Copy`
//! so they can be passed around without allocation.

use core::fmt;

use crate::adapters::ble::BleError;
use crate::adapters::wifi::ConnectivityError;
use crate::app::ports::{ConfigError, ReportError, StorageError};
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor transaction failed.
    Sensor(SensorError),
    /// A core driver did not come up at boot. This is the only fatal path.
    Init {
        device: &'static str,
        cause: SensorError,
    },
    /// ADC, LEDC or LCD bring-up failed.
    HwInit(HwInitError),
    /// Stored configuration could not be loaded or saved.
    Config(ConfigError),
    /// NVS key-value access failed.
    Storage(StorageError),
    /// WiFi station could not be started.
    Connectivity(ConnectivityError),
    /// BLE stack bring-up failed.
    Ble(BleError),
    /// The remote telemetry endpoint could not be reached.
    Report(ReportError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Init { device, cause } => write!(f, "init: {device}: {cause}"),
            Self::HwInit(e) => write!(f, "hw: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Connectivity(e) => write!(f, "wifi: {e}"),
            Self::Ble(e) => write!(f, "ble: {e}"),
            Self::Report(e) => write!(f, "report: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transaction failed (NACK, arbitration loss, timeout).
    Bus,
    /// Device answered with an unexpected ID or status.
    NotResponding,
    /// Measurement not ready yet.
    Busy,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "I2C bus error"),
            Self::NotResponding => write!(f, "device not responding"),
            Self::Busy => write!(f, "measurement busy"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<ReportError> for Error {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::HwInit(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Self::Ble(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
