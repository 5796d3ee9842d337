//! WiFi station-mode adapter.
//!
//! Joins the access point named by the stored credentials and blocks
//! until the station has an IP address.  The join is polled every
//! `wifi_join_retry_ms`; there is no overall timeout.  Credentials that
//! are missing or unusable leave the join stalled: it keeps polling and
//! never completes.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use core::fmt;
use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::ports::WifiCredentials;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    InvalidSsid,
    InvalidPassword,
    /// The WiFi driver could not be created or configured.
    DriverFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::DriverFailed => write!(f, "WiFi driver error"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !super::utils::is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

pub fn validate_credentials(creds: &WifiCredentials) -> Result<(), ConnectivityError> {
    validate_ssid(&creds.ssid)?;
    validate_password(&creds.password)
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Idle,
    Joining,
    /// The join was started with credentials it cannot use.
    Stalled,
    Connected(Ipv4Addr),
}

/// Re-issue the connect request every this many unanswered polls.
const RECONNECT_EVERY_POLLS: u32 = 20;
/// Repeat the stalled-join warning every this many polls.
const STALL_LOG_EVERY_POLLS: u32 = 20;

pub struct WifiAdapter {
    state: WifiState,
    polls: u32,
    #[cfg(target_os = "espidf")]
    wifi: Box<EspWifi<'static>>,
    /// Simulation: polls remaining before the link comes up.
    #[cfg(not(target_os = "espidf"))]
    sim_polls_left: u32,
    /// Simulation: connect requests issued.
    #[cfg(not(target_os = "espidf"))]
    sim_connects: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(modem: Modem, sysloop: EspSystemEventLoop) -> Result<Self, ConnectivityError> {
        let wifi = EspWifi::new(modem, sysloop, None).map_err(|e| {
            warn!("WiFi: driver init failed: {}", e);
            ConnectivityError::DriverFailed
        })?;
        Ok(Self {
            state: WifiState::Idle,
            polls: 0,
            wifi: Box::new(wifi),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Idle,
            polls: 0,
            sim_polls_left: 0,
            sim_connects: 0,
        }
    }

    /// Simulation: make the next join take `polls` retries.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_polls_until_connected(&mut self, polls: u32) {
        self.sim_polls_left = polls;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connect_requests(&self) -> u32 {
        self.sim_connects
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn ip_address(&self) -> Option<Ipv4Addr> {
        match self.state {
            WifiState::Connected(ip) => Some(ip),
            _ => None,
        }
    }

    /// Polls taken by the current join.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Validate `creds` and start the station.
    ///
    /// On failure the adapter is left [`WifiState::Stalled`]; later polls
    /// keep returning `None`.
    pub fn begin(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityError> {
        self.polls = 0;
        if let Err(e) = validate_credentials(creds).and_then(|()| self.platform_begin(creds)) {
            warn!("WiFi: {}, join stalled", e);
            self.state = WifiState::Stalled;
            return Err(e);
        }
        info!("WiFi: connecting to '{}'", creds.ssid);
        self.state = WifiState::Joining;
        Ok(())
    }

    /// One join poll.  Returns the station address once the link is up.
    pub fn poll_join(&mut self) -> Option<Ipv4Addr> {
        match self.state {
            WifiState::Connected(ip) => return Some(ip),
            WifiState::Idle => return None,
            WifiState::Stalled => {
                self.polls += 1;
                if self.polls % STALL_LOG_EVERY_POLLS == 0 {
                    warn!("WiFi: join stalled, no usable credentials ({} polls)", self.polls);
                }
                return None;
            }
            WifiState::Joining => {}
        }

        if let Some(ip) = self.platform_poll() {
            self.state = WifiState::Connected(ip);
            info!("WiFi: connected, IP address {}", ip);
            return Some(ip);
        }
        self.polls += 1;
        if self.polls % RECONNECT_EVERY_POLLS == 0 {
            warn!("WiFi: still joining after {} polls, re-issuing connect", self.polls);
            self.platform_reconnect();
        } else {
            info!("WiFi: waiting for link ({})", self.polls);
        }
        None
    }

    /// Start the join and block until the station has an address.
    ///
    /// There is no timeout.  With unusable credentials this never returns.
    pub fn join<D: DelayNs>(&mut self, creds: &WifiCredentials, retry_ms: u32, delay: &mut D) -> Ipv4Addr {
        // A rejected begin leaves the adapter stalled; keep polling anyway.
        let _ = self.begin(creds);
        loop {
            if let Some(ip) = self.poll_join() {
                return ip;
            }
            delay.delay_ms(retry_ms);
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityError> {
        let auth_method = if creds.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: creds.ssid.clone(),
            password: creds.password.clone(),
            auth_method,
            ..Default::default()
        });
        self.wifi.set_configuration(&config).map_err(|e| {
            warn!("WiFi: set_configuration failed: {}", e);
            ConnectivityError::DriverFailed
        })?;
        self.wifi.start().map_err(|_| ConnectivityError::DriverFailed)?;
        // A failed first request is retried by the poll loop.
        if let Err(e) = self.wifi.connect() {
            warn!("WiFi: connect request failed: {}", e);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self, _creds: &WifiCredentials) -> Result<(), ConnectivityError> {
        self.sim_connects += 1;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_poll(&mut self) -> Option<Ipv4Addr> {
        if !self.wifi.is_up().unwrap_or(false) {
            return None;
        }
        self.wifi.sta_netif().get_ip_info().ok().map(|info| info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_poll(&mut self) -> Option<Ipv4Addr> {
        if self.sim_polls_left > 0 {
            self.sim_polls_left -= 1;
            return None;
        }
        Some(Ipv4Addr::new(192, 168, 4, 2))
    }

    #[cfg(target_os = "espidf")]
    fn platform_reconnect(&mut self) {
        let _ = self.wifi.disconnect();
        if let Err(e) = self.wifi.connect() {
            warn!("WiFi: connect request failed: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_reconnect(&mut self) {
        self.sim_connects += 1;
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
