//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, display, BLE, HTTP, NVS)
//! implement these traits.  The [`MonitorService`](super::service::MonitorService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! ## Failure model
//!
//! - **SensorPort**, **ActuatorPort**, **DisplayPort** and **NotifyPort**
//!   expose no failure path; adapters log and degrade internally.
//! - **ReportPort** returns a typed error so the fan-out can log it, but
//!   the caller never retries.
//! - **ConfigPort** implementations MUST validate before persisting.

use embedded_graphics::pixelcolor::Rgb565;

use crate::app::snapshot::SensorSnapshot;
use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per tick.
pub trait SensorPort {
    /// Read every sensor and return a fully populated snapshot.
    fn read_all(&mut self) -> SensorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Move the fan servo to `degrees` (0–180).
    fn set_fan_angle(&mut self, degrees: u8);

    /// Start a tone; returns immediately, the adapter silences it later.
    fn sound_alarm(&mut self, freq_hz: u32, duration_ms: u32);

    /// Housekeeping for time-based actuators (e.g. ending a tone).
    fn poll(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → TFT)
// ───────────────────────────────────────────────────────────────

/// Minimal text-console surface, modelled on a cursor-based TFT API.
pub trait DisplayPort {
    /// Fill the whole screen with `color`.
    fn clear(&mut self, color: Rgb565);

    /// Move the text cursor (top-left of the next glyph row), in pixels.
    fn set_cursor(&mut self, x: i32, y: i32);

    /// Draw `text` at the cursor.
    fn print(&mut self, text: &str);

    /// Push the composed frame to the panel, if the adapter buffers.
    fn flush(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Notify port (driven adapter: domain → BLE characteristic)
// ───────────────────────────────────────────────────────────────

/// Short-range wireless notification channel.
pub trait NotifyPort {
    /// Push `payload` to subscribed centrals.  Must be a silent no-op
    /// when no central is connected.
    fn notify(&mut self, payload: &str);
}

// ───────────────────────────────────────────────────────────────
// Report port (driven adapter: domain → remote HTTP endpoint)
// ───────────────────────────────────────────────────────────────

/// Status code carried in the `statusCode` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// Per-tick telemetry.
    Routine,
    /// Alert detail.
    Alert,
}

impl ReportStatus {
    pub const fn code(self) -> u16 {
        match self {
            Self::Routine => 200,
            Self::Alert => 500,
        }
    }
}

/// Fire-and-forget remote reporting.
pub trait ReportPort {
    /// Send one report.  Returns the HTTP status the server answered with.
    fn report(&mut self, status: ReportStatus, info: &str) -> Result<u16, ReportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain ↔ monotonic timer)
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Credential port (driven adapter: boot ↔ stored WiFi credentials)
// ───────────────────────────────────────────────────────────────

/// Network name and secret, read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

pub trait CredentialPort {
    fn load_credentials(&self) -> Result<WifiCredentials, StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the tick body)
// ───────────────────────────────────────────────────────────────

/// Callback the [`TickScheduler`](crate::scheduler::TickScheduler) invokes
/// once per period.
pub trait TickDelegate {
    /// `tick` counts from 1.
    fn on_tick(&mut self, tick: u64);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ReportPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportError {
    /// TCP connect / DNS failed before any response.
    Connect,
    /// No response within the configured timeout.
    Timeout,
    /// Request URL did not fit the request buffer.
    UrlTooLong,
    /// Any other transport failure.
    Transport,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`CredentialPort`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Stored bytes are not valid for the requested type.
    InvalidData,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ReportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Connect => write!(f, "connection failed"),
            Self::Timeout => write!(f, "timed out"),
            Self::UrlTooLong => write!(f, "request URL too long"),
            Self::Transport => write!(f, "transport error"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::InvalidData => write!(f, "invalid stored data"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
