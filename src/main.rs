//! EnvMon Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single fixed-period tick loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   TextConsole    LogEventSink   Esp32Time     │
//! │  (Sensor+Actuator) (Display)      (EventSink)    (ClockPort)   │
//! │  BleAdapter        HttpReporter   NvsAdapter     WifiAdapter   │
//! │  (NotifyPort)      (ReportPort)   (Config+Creds) (boot join)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MonitorService (pure logic)                 │    │
//! │  │  fan mapping · alert rules · telemetry · fan-out       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TickScheduler (delegate-driven)                               │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;

use envmon::adapters::ble::{BleAdapter, BLE_CONNECTION};
use envmon::adapters::hardware::HardwareAdapter;
use envmon::adapters::http::HttpReporter;
use envmon::adapters::log_sink::LogEventSink;
use envmon::adapters::nvs::NvsAdapter;
use envmon::adapters::time::Esp32TimeAdapter;
use envmon::adapters::wifi::WifiAdapter;
use envmon::app::ports::{
    ActuatorPort, DisplayPort, NotifyPort, ReportPort, SensorPort, TickDelegate, WifiCredentials,
};
use envmon::app::service::MonitorService;
use envmon::boot;
use envmon::config::SystemConfig;
use envmon::drivers::buzzer::BuzzerDriver;
use envmon::drivers::framebuffer::TextConsole;
use envmon::drivers::hw_init;
use envmon::drivers::servo::ServoDriver;
use envmon::drivers::tft::St7789;
use envmon::error::{Error, SensorError};
use envmon::fanout::Fanout;
use envmon::pins;
use envmon::scheduler::TickScheduler;

// ── Tick delegate ─────────────────────────────────────────────
//
// Owns every adapter the tick touches so the scheduler only has to
// know about `on_tick`.

struct MonitorLoop<'a, H, D, B, R> {
    service: MonitorService,
    hw: H,
    screen: D,
    fanout: Fanout<'a>,
    ble: B,
    remote: R,
    sink: LogEventSink,
}

impl<H, D, B, R> TickDelegate for MonitorLoop<'_, H, D, B, R>
where
    H: SensorPort + ActuatorPort,
    D: DisplayPort,
    B: NotifyPort,
    R: ReportPort,
{
    fn on_tick(&mut self, _tick: u64) {
        self.service.tick(
            &mut self.hw,
            &mut self.screen,
            &self.fanout,
            &mut self.ble,
            &mut self.remote,
            &mut self.sink,
        );
    }
}

/// Park the main task forever; the screen keeps whatever was last drawn.
/// Also how a network join that can never complete looks from outside.
fn halt() -> ! {
    loop {
        FreeRtos::delay_ms(1000);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EnvMon v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. Panel first, so later failures can be shown ───────
    let panel = match St7789::init() {
        Ok(p) => p,
        Err(e) => {
            error!("TFT init failed: {}, halting", e);
            halt();
        }
    };
    let mut screen = TextConsole::new(panel, pins::TFT_WIDTH, pins::TFT_HEIGHT);

    // ── 3. Core bring-up: any failure paints the error screen ─
    if boot::require(hw_init::init_peripherals(), &mut screen).is_err() {
        halt();
    }
    // GPIO21 / GPIO22, see pins::I2C_SDA_GPIO / I2C_SCL_GPIO.
    let bus = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )
    .map_err(|e| {
        warn!("I2C driver: {}", e);
        Error::Init { device: "I2C bus", cause: SensorError::Bus }
    });
    let Ok(hub) = boot::bring_up_sensors(bus, FreeRtos, &mut screen) else {
        halt();
    };

    // ── 4. Config and credentials from NVS (non-fatal) ────────
    let nvs = match NvsAdapter::new() {
        Ok(nvs) => Some(nvs),
        Err(e) => {
            warn!("NVS unavailable ({}), using defaults", e);
            None
        }
    };
    let config = nvs.as_ref().map_or_else(SystemConfig::default, boot::load_config);
    let creds = nvs.as_ref().map_or_else(WifiCredentials::default, boot::load_credentials);

    // ── 5. BLE ────────────────────────────────────────────────
    let mut ble = BleAdapter::new(config.ble_device_name.clone(), &BLE_CONNECTION);
    if let Err(e) = ble.start() {
        // Notify stays a no-op; everything else keeps running.
        warn!("BLE unavailable: {}", e);
    }

    // ── 6. WiFi: blocks until joined, with no timeout ────────
    let mut wifi = match WifiAdapter::new(peripherals.modem, sysloop) {
        Ok(w) => w,
        Err(e) => {
            error!("WiFi driver unavailable: {}, network join stalled", e);
            halt();
        }
    };
    let ip = wifi.join(&creds, config.wifi_join_retry_ms, &mut FreeRtos);

    // ── 7. Tick loop ──────────────────────────────────────────
    let hw = HardwareAdapter::new(
        hub,
        ServoDriver::new(),
        BuzzerDriver::new(),
        Esp32TimeAdapter::new(),
    );
    let mut service = MonitorService::new(&config);
    let mut sink = LogEventSink::new();
    service.start(&mut sink);

    let mut delegate = MonitorLoop {
        service,
        hw,
        screen,
        fanout: Fanout::new(&BLE_CONNECTION, config.buzzer_freq_hz, config.buzzer_duration_ms),
        ble,
        remote: HttpReporter::from_config(&config),
        sink,
    };

    info!(
        "Setup complete (IP {}), entering {} ms tick loop",
        ip, config.tick_interval_ms
    );

    let clock = Esp32TimeAdapter::new();
    let mut delay = FreeRtos;
    let mut sched_sink = LogEventSink::new();
    TickScheduler::from_config(&config).run_forever(&mut delegate, &clock, &mut delay, &mut sched_sink)
}
