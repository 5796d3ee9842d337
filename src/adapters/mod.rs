//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `ble`          | NotifyPort         | Bluedroid GATT server    |
//! | `hardware`     | SensorPort         | I2C sensors, LDR ADC     |
//! |                | ActuatorPort       | LEDC servo + buzzer      |
//! | `http`         | ReportPort         | HTTP GET endpoint        |
//! | `log_sink`     | EventSink          | Serial log output        |
//! | `nvs`          | ConfigPort         | NVS / in-memory store    |
//! |                | CredentialPort     |                          |
//! | `time`         | ClockPort          | ESP32 system timer       |
//! | `wifi`         | (boot only)        | ESP-IDF WiFi STA         |

pub mod ble;
pub mod hardware;
pub mod http;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub(super) mod utils;
pub mod wifi;
