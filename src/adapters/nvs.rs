//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] and [`CredentialPort`].
//!
//! - Config validation: all fields are range-checked before persistence.
//! - Namespaces: config lives in `envmon`, WiFi credentials in `storage`
//!   as two NUL-terminated strings (`ssid`, `pass`).
//! - Atomic writes: ESP-IDF NVS commits are atomic per nvs_commit().

use crate::app::ports::{
    ConfigError, ConfigPort, CredentialPort, StorageError, WifiCredentials,
};
use crate::config::SystemConfig;
use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "envmon";
const CONFIG_KEY: &str = "syscfg";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 4000;

pub const CRED_NAMESPACE: &str = "storage";
pub const CRED_SSID_KEY: &str = "ssid";
pub const CRED_PASS_KEY: &str = "pass";

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably. On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of a namespace or key (NVS limit: 15 chars).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: ns_buf is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns_buf.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        // SAFETY: handle was opened above and is not used afterwards.
        unsafe {
            nvs_close(handle);
        }
        result
    }

    // ── String values (WiFi credentials) ──────────────────────

    /// Read a string value into `buf` and borrow it back as `&str`.
    #[cfg(target_os = "espidf")]
    fn read_str<'b>(&self, namespace: &str, key: &str, buf: &'b mut [u8]) -> Result<&'b str, StorageError> {
        let key_buf = Self::c_name(key);
        let result = Self::with_nvs_handle(namespace, false, |handle| {
            let mut size = buf.len();
            // SAFETY: buf is writable for `size` bytes; key is NUL-terminated.
            let ret = unsafe { nvs_get_str(handle, key_buf.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });
        let size = match result {
            Ok(size) => size,
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => return Err(StorageError::NotFound),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => return Err(StorageError::InvalidData),
            Err(_) => return Err(StorageError::IoError),
        };
        let buf: &'b [u8] = buf;
        // `size` includes the terminating NUL.
        core::str::from_utf8(&buf[..size.saturating_sub(1)]).map_err(|_| StorageError::InvalidData)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_str<'b>(&self, namespace: &str, key: &str, buf: &'b mut [u8]) -> Result<&'b str, StorageError> {
        let composite = Self::composite_key(namespace, key);
        let store = self.store.borrow();
        let data = store.get(&composite).ok_or(StorageError::NotFound)?;
        if data.len() > buf.len() {
            return Err(StorageError::InvalidData);
        }
        buf[..data.len()].copy_from_slice(data);
        let buf: &'b [u8] = buf;
        core::str::from_utf8(&buf[..data.len()]).map_err(|_| StorageError::InvalidData)
    }

    /// Simulation: seed a raw string value, as a provisioning tool would.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_put_str(&self, namespace: &str, key: &str, value: &[u8]) {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().insert(composite, value.to_vec());
    }

    /// Simulation: seed both credential keys.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_put_credentials(&self, creds: &WifiCredentials) {
        self.sim_put_str(CRED_NAMESPACE, CRED_SSID_KEY, creds.ssid.as_bytes());
        self.sim_put_str(CRED_NAMESPACE, CRED_PASS_KEY, creds.password.as_bytes());
    }
}

pub(crate) fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(100..=60_000).contains(&cfg.tick_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "tick_interval_ms must be 100–60000",
        ));
    }
    if cfg.ble_device_name.is_empty() || !super::utils::is_printable_ascii(&cfg.ble_device_name) {
        return Err(ConfigError::ValidationFailed(
            "ble_device_name must be non-empty printable ASCII",
        ));
    }
    if cfg.report_host.is_empty() {
        return Err(ConfigError::ValidationFailed("report_host must be set"));
    }
    if cfg.report_port == 0 {
        return Err(ConfigError::ValidationFailed("report_port must be non-zero"));
    }
    if !cfg.report_path.starts_with('/') {
        return Err(ConfigError::ValidationFailed(
            "report_path must start with '/'",
        ));
    }
    if !(100..=60_000).contains(&cfg.report_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "report_timeout_ms must be 100–60000",
        ));
    }
    let t = &cfg.thresholds;
    let floats = [
        t.min_temperature_c,
        t.min_humidity_pct,
        t.max_abs_accel_x,
        t.max_abs_accel_y,
        t.min_accel_z,
    ];
    if floats.iter().any(|v| !v.is_finite()) {
        return Err(ConfigError::ValidationFailed("thresholds must be finite"));
    }
    if t.max_abs_accel_x < 0.0 || t.max_abs_accel_y < 0.0 {
        return Err(ConfigError::ValidationFailed(
            "accel band limits must be >= 0",
        ));
    }
    if t.min_light_level > 4095 {
        return Err(ConfigError::ValidationFailed(
            "min_light_level must be 0–4095",
        ));
    }
    if !(20..=20_000).contains(&cfg.buzzer_freq_hz) {
        return Err(ConfigError::ValidationFailed(
            "buzzer_freq_hz must be 20–20000",
        ));
    }
    if cfg.buzzer_duration_ms > 10_000 {
        return Err(ConfigError::ValidationFailed(
            "buzzer_duration_ms must be 0–10000",
        ));
    }
    if cfg.fan_neutral_angle > 180 {
        return Err(ConfigError::ValidationFailed(
            "fan_neutral_angle must be 0–180",
        ));
    }
    if !(50..=10_000).contains(&cfg.wifi_join_retry_ms) {
        return Err(ConfigError::ValidationFailed(
            "wifi_join_retry_ms must be 50–10000",
        ));
    }
    Ok(())
}

/// Deserialize a stored config blob and re-check its ranges.
pub fn decode_config(bytes: &[u8]) -> Result<SystemConfig, ConfigError> {
    let cfg: SystemConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            if let Some(bytes) = self.store.borrow().get(&key) {
                let cfg = decode_config(bytes)?;
                info!("NvsAdapter: loaded config from store");
                Ok(cfg)
            } else {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let key_buf = Self::c_name(CONFIG_KEY);
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
                let mut size: usize = 0;

                // First call: get size
                // SAFETY: a null out-pointer asks NVS for the length only.
                let ret = unsafe {
                    nvs_get_blob(handle, key_buf.as_ptr().cast(), core::ptr::null_mut(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_ERR_NVS_INVALID_LENGTH);
                }

                let mut buf = vec![0u8; size];
                // SAFETY: buf holds exactly `size` bytes.
                let ret = unsafe {
                    nvs_get_blob(handle, key_buf.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg = decode_config(&bytes)?;
                    info!("NvsAdapter: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                    info!("NvsAdapter: no stored config, using defaults");
                    Ok(SystemConfig::default())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {}, using defaults", e);
                    Ok(SystemConfig::default())
                }
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key_buf = Self::c_name(CONFIG_KEY);
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
                // SAFETY: bytes outlives the call; key is NUL-terminated.
                let ret = unsafe {
                    nvs_set_blob(handle, key_buf.as_ptr().cast(), bytes.as_ptr().cast(), bytes.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

impl CredentialPort for NvsAdapter {
    fn load_credentials(&self) -> Result<WifiCredentials, StorageError> {
        let mut creds = WifiCredentials::default();

        let mut buf = [0u8; 33];
        let ssid = self.read_str(CRED_NAMESPACE, CRED_SSID_KEY, &mut buf)?;
        creds.ssid.push_str(ssid).map_err(|()| StorageError::InvalidData)?;

        let mut buf = [0u8; 65];
        let pass = self.read_str(CRED_NAMESPACE, CRED_PASS_KEY, &mut buf)?;
        creds.password.push_str(pass).map_err(|()| StorageError::InvalidData)?;

        info!("NvsAdapter: credentials loaded for '{}'", creds.ssid);
        Ok(creds)
    }
}
