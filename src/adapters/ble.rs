//! BLE telemetry adapter.
//!
//! Implements [`NotifyPort`] on top of a single GATT service with one
//! read/notify characteristic.  The telemetry line of every tick is
//! written to the characteristic value and pushed to the connected
//! central.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GATT server via raw `esp_idf_svc::sys` calls.
//! - **all other targets**: simulation that records every payload.
//!
//! ## GATT Service Layout
//!
//! | Attribute   | UUID                                    | Perms        |
//! |-------------|-----------------------------------------|--------------|
//! | Service     | `4fafc201-1fb5-459e-8fcc-c5c9c331914b`  |              |
//! | Telemetry   | `beb5483e-36e1-4688-b7f5-ea07361b26a8`  | Read+Notify  |
//! | CCCD        | `0x2902`                                | Read+Write   |

use core::fmt;

use log::{info, warn};

use crate::app::connection::ConnectionState;
use crate::app::ports::NotifyPort;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x4fafc201_1fb5_459e_8fcc_c5c9c331914b;
pub const CHAR_TELEMETRY: u128 = 0xbeb5483e_36e1_4688_b7f5_ea07361b26a8;
pub const DESCR_CCCD: u16 = 0x2902;

/// Characteristic value capacity.  Longer payloads are truncated.
pub const MAX_PAYLOAD_BYTES: usize = 128;

/// Written by the GATTS connect/disconnect callbacks, read by the fan-out.
pub static BLE_CONNECTION: ConnectionState = ConnectionState::new();

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleError {
    /// An ESP-IDF Bluetooth call failed during bring-up.
    StackInitFailed { step: &'static str, code: i32 },
    /// Device name is empty, too long, or not printable ASCII.
    InvalidName,
}

impl fmt::Display for BleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackInitFailed { step, code } => {
                write!(f, "BLE stack initialisation failed at {} ({})", step, code)
            }
            Self::InvalidName => write!(f, "BLE device name invalid"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Failed,
}

/// Longest payload prefix that fits the characteristic without
/// splitting a UTF-8 sequence.
fn clip_payload(payload: &str) -> &str {
    if payload.len() <= MAX_PAYLOAD_BYTES {
        return payload;
    }
    let mut end = MAX_PAYLOAD_BYTES;
    while !payload.is_char_boundary(end) {
        end -= 1;
    }
    &payload[..end]
}

// ── ESP-IDF BLE static state ──────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These atomics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_TELEMETRY_HANDLE: AtomicU32 = AtomicU32::new(0);

#[cfg(target_os = "espidf")]
static SERVICE_UUID_LE: [u8; 16] = SERVICE_UUID.to_le_bytes();

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    // SAFETY: esp_bt_uuid_t is a plain C struct/union; all-zero is valid.
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    t.uuid.uuid128 = uuid.to_le_bytes();
    t
}

#[cfg(target_os = "espidf")]
fn uuid16_to_esp(uuid: u16) -> esp_idf_svc::sys::esp_bt_uuid_t {
    // SAFETY: as above.
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 2;
    t.uuid.uuid16 = uuid;
    t
}

#[cfg(target_os = "espidf")]
fn adv_params() -> esp_idf_svc::sys::esp_ble_adv_params_t {
    use esp_idf_svc::sys::*;
    esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        // SAFETY: remaining fields are a peer address, zero means "none".
        ..unsafe { core::mem::zeroed() }
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => {
            let mut params = adv_params();
            esp_ble_gap_start_advertising(&mut params);
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid128_to_esp(SERVICE_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            };
            // Service, characteristic declaration + value, CCCD.
            esp_ble_gatts_create_service(gatts_if, &mut svc_id, 4);
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let svc_handle = (*param).create.service_handle;
            BLE_SVC_HANDLE.store(u32::from(svc_handle), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            esp_ble_gatts_start_service(svc_handle);

            let mut char_uuid = uuid128_to_esp(CHAR_TELEMETRY);
            let mut initial = [0u8; 1];
            let mut value = esp_attr_value_t {
                attr_max_len: MAX_PAYLOAD_BYTES as u16,
                attr_len: 0,
                attr_value: initial.as_mut_ptr(),
            };
            let mut control = esp_attr_control_t {
                auto_rsp: ESP_GATT_AUTO_RSP as u8,
            };
            esp_ble_gatts_add_char(
                svc_handle,
                &mut char_uuid,
                ESP_GATT_PERM_READ as esp_gatt_perm_t,
                (ESP_GATT_CHAR_PROP_BIT_READ | ESP_GATT_CHAR_PROP_BIT_NOTIFY) as esp_gatt_char_prop_t,
                &mut value,
                &mut control,
            );
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let handle = (*param).add_char.attr_handle;
            BLE_TELEMETRY_HANDLE.store(u32::from(handle), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: telemetry char (handle={})", handle);

            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
            let mut descr_uuid = uuid16_to_esp(DESCR_CCCD);
            let mut cccd = [0u8; 2];
            let mut value = esp_attr_value_t {
                attr_max_len: 2,
                attr_len: 2,
                attr_value: cccd.as_mut_ptr(),
            };
            let mut control = esp_attr_control_t {
                auto_rsp: ESP_GATT_AUTO_RSP as u8,
            };
            esp_ble_gatts_add_char_descr(
                svc_handle,
                &mut descr_uuid,
                (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                &mut value,
                &mut control,
            );
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            log::info!(
                "BLE GATTS: CCCD added (handle={})",
                (*param).add_char_descr.attr_handle
            );
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let p = &(*param).connect;
            BLE_CONN_ID.store(u32::from(p.conn_id), AtomicOrdering::Relaxed);
            BLE_CONNECTION.set_connected(true);
            log::info!("BLE   | device connected (conn_id={})", p.conn_id);
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            BLE_CONNECTION.set_connected(false);
            log::info!("BLE   | device disconnected");
            let mut params = adv_params();
            esp_ble_gap_start_advertising(&mut params);
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleAdapter {
    state: BleState,
    device_name: heapless::String<24>,
    connection: &'static ConnectionState,
    value: heapless::String<MAX_PAYLOAD_BYTES>,
    /// Simulation: every payload that reached a connected central.
    #[cfg(not(target_os = "espidf"))]
    sim_sent: Vec<String>,
}

impl BleAdapter {
    /// `connection` is the flag the GATTS callbacks write; on device this
    /// is always [`BLE_CONNECTION`].
    pub fn new(device_name: heapless::String<24>, connection: &'static ConnectionState) -> Self {
        Self {
            state: BleState::Idle,
            device_name,
            connection,
            value: heapless::String::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_sent: Vec::new(),
        }
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    pub fn connection(&self) -> &'static ConnectionState {
        self.connection
    }

    /// Current characteristic value (what a READ would return).
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Bring up the stack, register the service and start advertising.
    pub fn start(&mut self) -> Result<(), BleError> {
        if self.device_name.is_empty() || !super::utils::is_printable_ascii(&self.device_name) {
            return Err(BleError::InvalidName);
        }
        info!("BLE: starting advertising as '{}'", self.device_name);
        if let Err(e) = self.platform_start() {
            self.state = BleState::Failed;
            return Err(e);
        }
        self.state = BleState::Advertising;
        info!("BLE: initialised and advertising");
        Ok(())
    }

    /// Connection callback body; the espidf GATTS handler does the same
    /// from the Bluedroid task.
    pub fn on_central_connected(&mut self) {
        self.connection.set_connected(true);
        info!("BLE   | device connected");
    }

    pub fn on_central_disconnected(&mut self) {
        self.connection.set_connected(false);
        info!("BLE   | device disconnected");
        self.platform_readvertise();
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), BleError> {
        use esp_idf_svc::sys::*;

        fn check(step: &'static str, ret: i32) -> Result<(), BleError> {
            if ret == ESP_OK as i32 {
                Ok(())
            } else {
                log::error!("BLE: {} failed ({})", step, ret);
                Err(BleError::StackInitFailed { step, code: ret })
            }
        }

        // NUL-terminated copy for the C API.
        let mut name = heapless::Vec::<u8, 25>::new();
        if name.extend_from_slice(self.device_name.as_bytes()).is_err() || name.push(0).is_err() {
            return Err(BleError::InvalidName);
        }

        // SAFETY: called once from the main task before any other BT use.
        // Callbacks are 'static fns and every pointer passed below is
        // either copied by the stack before return or points to static data.
        unsafe {
            // BLE-only: hand classic BT memory back to the heap.
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            check("bt_controller_init", esp_bt_controller_init(&mut bt_cfg))?;
            check(
                "bt_controller_enable",
                esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE),
            )?;
            check("bluedroid_init", esp_bluedroid_init())?;
            check("bluedroid_enable", esp_bluedroid_enable())?;

            check(
                "gap_register_callback",
                esp_ble_gap_register_callback(Some(ble_gap_event_handler)),
            )?;
            check(
                "gatts_register_callback",
                esp_ble_gatts_register_callback(Some(ble_gatts_event_handler)),
            )?;
            check("gatts_app_register", esp_ble_gatts_app_register(0))?;

            check(
                "gap_set_device_name",
                esp_ble_gap_set_device_name(name.as_ptr() as *const _),
            )?;

            // Advertising starts from the GAP handler once the data is set.
            let mut adv_data = esp_ble_adv_data_t {
                set_scan_rsp: false,
                include_name: true,
                include_txpower: false,
                min_interval: 0x0006,
                max_interval: 0x0010,
                service_uuid_len: SERVICE_UUID_LE.len() as u16,
                p_service_uuid: SERVICE_UUID_LE.as_ptr() as *mut u8,
                flag: (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8,
                ..core::mem::zeroed()
            };
            check("gap_config_adv_data", esp_ble_gap_config_adv_data(&mut adv_data))?;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), BleError> {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name, SERVICE_UUID
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_readvertise(&mut self) {
        let mut params = adv_params();
        // SAFETY: params lives for the duration of the call.
        unsafe { esp_idf_svc::sys::esp_ble_gap_start_advertising(&mut params) };
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_readvertise(&mut self) {
        info!("BLE(sim): advertising restarted");
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(&mut self) {
        use esp_idf_svc::sys::*;
        let handle = BLE_TELEMETRY_HANDLE.load(AtomicOrdering::Relaxed) as u16;
        if handle == 0 {
            warn!("BLE: characteristic not registered yet, notify dropped");
            return;
        }
        let len = self.value.len() as u16;
        let ptr = self.value.as_ptr() as *mut u8;
        // SAFETY: both calls copy `len` bytes from `ptr` before returning.
        unsafe {
            esp_ble_gatts_set_attr_value(handle, len, ptr);
            esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(AtomicOrdering::Relaxed) as esp_gatt_if_t,
                BLE_CONN_ID.load(AtomicOrdering::Relaxed) as u16,
                handle,
                len,
                ptr,
                false,
            );
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(&mut self) {
        self.sim_sent.push(self.value.as_str().to_owned());
    }

    /// Simulation: payloads delivered so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> &[String] {
        &self.sim_sent
    }
}

// ───────────────────────────────────────────────────────────────
// NotifyPort implementation
// ───────────────────────────────────────────────────────────────

impl NotifyPort for BleAdapter {
    fn notify(&mut self, payload: &str) {
        if self.state != BleState::Advertising || !self.connection.is_connected() {
            return;
        }
        let clipped = clip_payload(payload);
        if clipped.len() < payload.len() {
            warn!(
                "BLE: payload truncated ({} > {})",
                payload.len(),
                MAX_PAYLOAD_BYTES
            );
        }
        self.value.clear();
        // Fits: clipped to the buffer capacity above.
        let _ = self.value.push_str(clipped);
        self.platform_notify();
        log::debug!("BLE   | sent: {}", self.value);
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
