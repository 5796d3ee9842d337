//! Boot sequence: core bring-up failures end on the init error screen,
//! storage and credential failures fall back and leave the network join
//! stalled rather than skipped.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use envmon::adapters::nvs::{NvsAdapter, CRED_NAMESPACE, CRED_PASS_KEY, CRED_SSID_KEY};
use envmon::adapters::wifi::{ConnectivityError, WifiAdapter, WifiState};
use envmon::app::ports::{ConfigError, ConfigPort, CredentialPort, StorageError, WifiCredentials};
use envmon::boot;
use envmon::config::SystemConfig;
use envmon::display;
use envmon::drivers::hw_init::HwInitError;
use envmon::error::{Error, SensorError};

use crate::adapter_tests::{FakeBus, NoDelay};
use crate::mock_hw::{DisplayOp, MockDisplay};

/// Nothing on the bus answers.
struct EmptyBus;

impl ErrorType for EmptyBus {
    type Error = ErrorKind;
}

impl I2c for EmptyBus {
    fn transaction(&mut self, _address: u8, _operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
    }
}

/// NVS that fails every read.
struct BrokenStore;

impl ConfigPort for BrokenStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        Err(ConfigError::IoError)
    }

    fn save(&self, _config: &SystemConfig) -> Result<(), ConfigError> {
        Err(ConfigError::IoError)
    }
}

impl CredentialPort for BrokenStore {
    fn load_credentials(&self) -> Result<WifiCredentials, StorageError> {
        Err(StorageError::IoError)
    }
}

fn assert_init_error_screen(screen: &MockDisplay) {
    assert_eq!(screen.ops.first(), Some(&DisplayOp::Clear(display::ERROR_BACKGROUND)));
    assert_eq!(screen.screen_text(), [display::INIT_ERROR_TEXT]);
}

// ── Core bring-up ─────────────────────────────────────────────

#[test]
fn i2c_driver_failure_shows_init_error() {
    let mut screen = MockDisplay::default();
    let bus: Result<FakeBus, Error> = Err(Error::Init { device: "I2C bus", cause: SensorError::Bus });

    let result = boot::bring_up_sensors(bus, NoDelay, &mut screen);

    assert_eq!(result.err(), Some(Error::Init { device: "I2C bus", cause: SensorError::Bus }));
    assert_init_error_screen(&screen);
}

#[test]
fn silent_bus_shows_init_error() {
    let mut screen = MockDisplay::default();

    let result = boot::bring_up_sensors(Ok(EmptyBus), NoDelay, &mut screen);

    assert_eq!(result.err(), Some(Error::Init { device: "AHT20", cause: SensorError::Bus }));
    assert_init_error_screen(&screen);
}

#[test]
fn healthy_bus_leaves_screen_alone() {
    let mut screen = MockDisplay::default();
    assert!(boot::bring_up_sensors(Ok(FakeBus::healthy()), NoDelay, &mut screen).is_ok());
    assert!(screen.ops.is_empty());
}

#[test]
fn peripheral_failure_shows_init_error() {
    let mut screen = MockDisplay::default();

    let result = boot::require(Err::<(), _>(HwInitError::LedcInitFailed(-1)), &mut screen);

    assert_eq!(result, Err(Error::HwInit(HwInitError::LedcInitFailed(-1))));
    assert_init_error_screen(&screen);
}

// ── Storage and network ───────────────────────────────────────

#[test]
fn unreadable_store_falls_back_to_defaults() {
    assert_eq!(boot::load_config(&BrokenStore), SystemConfig::default());
    assert_eq!(boot::load_credentials(&BrokenStore), WifiCredentials::default());
}

#[test]
fn missing_credentials_stall_the_join() {
    let nvs = NvsAdapter::new().unwrap();
    let creds = boot::load_credentials(&nvs);
    assert_eq!(creds, WifiCredentials::default());

    let mut wifi = WifiAdapter::new();
    assert_eq!(wifi.begin(&creds), Err(ConnectivityError::InvalidSsid));
    for _ in 0..100 {
        assert_eq!(wifi.poll_join(), None);
    }
    assert_eq!(wifi.state(), WifiState::Stalled);
    assert_eq!(wifi.sim_connect_requests(), 0);
}

#[test]
fn invalid_stored_password_stalls_the_join() {
    let nvs = NvsAdapter::new().unwrap();
    nvs.sim_put_str(CRED_NAMESPACE, CRED_SSID_KEY, b"HomeWiFi");
    nvs.sim_put_str(CRED_NAMESPACE, CRED_PASS_KEY, b"short");
    let creds = boot::load_credentials(&nvs);
    assert_eq!(creds.ssid.as_str(), "HomeWiFi");

    let mut wifi = WifiAdapter::new();
    assert_eq!(wifi.begin(&creds), Err(ConnectivityError::InvalidPassword));
    assert_eq!(wifi.poll_join(), None);
    assert!(wifi.ip_address().is_none());
}

#[test]
fn stored_credentials_join() {
    let nvs = NvsAdapter::new().unwrap();
    nvs.sim_put_str(CRED_NAMESPACE, CRED_SSID_KEY, b"HomeWiFi");
    nvs.sim_put_str(CRED_NAMESPACE, CRED_PASS_KEY, b"mysecret8");

    let mut wifi = WifiAdapter::new();
    wifi.sim_set_polls_until_connected(2);
    let ip = wifi.join(&boot::load_credentials(&nvs), 500, &mut NoDelay);

    assert_eq!(wifi.state(), WifiState::Connected(ip));
    assert_eq!(wifi.polls(), 2);
}
