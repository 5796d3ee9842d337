//! Boot-time bring-up steps, shared by `main` and the host tests.
//!
//! Two failure tiers:
//!
//! - **Core** (I²C bus, the three sensors, ADC/LEDC): the failure is
//!   logged, the red init screen is painted and the caller halts.
//! - **Storage and network**: logged and replaced by a fallback.  A
//!   missing credential set yields an empty one, so the network join
//!   starts and then stalls instead of being skipped.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{error, info, warn};

use crate::app::ports::{ConfigPort, CredentialPort, DisplayPort, StorageError, WifiCredentials};
use crate::config::SystemConfig;
use crate::display;
use crate::error::Error;
use crate::sensors::SensorHub;

/// Pass a successful core step through, or paint the init error screen.
///
/// The caller must halt on `Err`.
pub fn require<T, E: Into<Error>>(step: Result<T, E>, screen: &mut impl DisplayPort) -> Result<T, Error> {
    step.map_err(|e| {
        let e: Error = e.into();
        error!("{}, halting", e);
        display::render_init_error(screen);
        e
    })
}

/// Open the sensor bus and bring up every sensor on it.
pub fn bring_up_sensors<I: I2c, D: DelayNs>(
    bus: Result<I, Error>,
    delay: D,
    screen: &mut impl DisplayPort,
) -> Result<SensorHub<I, D>, Error> {
    let mut hub = SensorHub::new(require(bus, screen)?, delay);
    require(hub.init(), screen)?;
    info!("boot: sensors ready");
    Ok(hub)
}

/// Stored configuration, or the defaults when it cannot be read.
pub fn load_config(store: &impl ConfigPort) -> SystemConfig {
    match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("boot: config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

/// Stored WiFi credentials, or an empty set that will stall the join.
pub fn load_credentials(store: &impl CredentialPort) -> WifiCredentials {
    match store.load_credentials() {
        Ok(creds) => creds,
        Err(StorageError::NotFound) => {
            warn!("boot: no WiFi credentials stored, network join will stall");
            WifiCredentials::default()
        }
        Err(e) => {
            warn!("boot: WiFi credentials unreadable ({}), network join will stall", e);
            WifiCredentials::default()
        }
    }
}
