//! Full-stack host tests: real adapters and drivers over a fake I2C bus.
//!
//! Only the bus, the delay, the clock and the remote endpoint are faked;
//! sensor decoding, servo duty, buzzer timing, framebuffer rendering and
//! the BLE simulation all run the production code paths.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Mutex;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use embedded_graphics::pixelcolor::raw::RawData;

use envmon::adapters::ble::BleAdapter;
use envmon::adapters::hardware::HardwareAdapter;
use envmon::adapters::log_sink::LogEventSink;
use envmon::adapters::nvs::NvsAdapter;
use envmon::app::connection::ConnectionState;
use envmon::app::ports::{
    ClockPort, ConfigPort, CredentialPort, ReportError, ReportPort, ReportStatus, StorageError, WifiCredentials,
};
use envmon::app::service::MonitorService;
use envmon::config::SystemConfig;
use envmon::display;
use envmon::drivers::buzzer::{BuzzerDriver, BuzzerState};
use envmon::drivers::framebuffer::{Panel, TextConsole};
use envmon::drivers::servo::{self, ServoDriver};
use envmon::fanout::Fanout;
use envmon::sensors::{light, SensorHub};

use crate::mock_hw::MockReporter;

// ── Fakes ─────────────────────────────────────────────────────

const CAP1188: u8 = 0x29;
const AHT20: u8 = 0x38;
// Strapped to the alternate address, so init exercises the fallback probe.
const LSM6DSO: u8 = 0x6A;

/// CAP1188 + LSM6DSO register files; AHT20 always returns `aht`.
pub(crate) struct FakeBus {
    touch: [u8; 256],
    imu: [u8; 256],
    ptr: u8,
    aht: [u8; 6],
}

impl FakeBus {
    /// 25 °C, 50 %RH, flat and still.
    pub(crate) fn healthy() -> Self {
        let mut touch = [0u8; 256];
        touch[0xFD] = 0x50;
        let mut imu = [0u8; 256];
        imu[0x0F] = 0x6C;
        let [lo, hi] = 16_393i16.to_le_bytes();
        imu[0x2C] = lo;
        imu[0x2D] = hi;
        Self {
            touch,
            imu,
            ptr: 0,
            aht: [0x1C, 0x80, 0x00, 0x06, 0x00, 0x00],
        }
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if ![CAP1188, AHT20, LSM6DSO].contains(&address) {
            return Err(ErrorKind::NoAcknowledge(embedded_hal::i2c::NoAcknowledgeSource::Address));
        }
        for op in operations {
            match (address, op) {
                (AHT20, Operation::Read(buf)) => {
                    let n = buf.len().min(6);
                    buf[..n].copy_from_slice(&self.aht[..n]);
                }
                (AHT20, Operation::Write(_)) => {}
                (addr, Operation::Write(bytes)) => {
                    let regs = if addr == CAP1188 { &mut self.touch } else { &mut self.imu };
                    if let Some((&reg, rest)) = bytes.split_first() {
                        self.ptr = reg;
                        for (i, b) in rest.iter().enumerate() {
                            regs[usize::from(reg) + i] = *b;
                        }
                    }
                }
                (addr, Operation::Read(buf)) => {
                    let regs = if addr == CAP1188 { &self.touch } else { &self.imu };
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = regs[usize::from(self.ptr) + i];
                    }
                }
            }
        }
        Ok(())
    }
}

pub(crate) struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Clone, Default)]
struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

#[derive(Default)]
struct FrameCounter {
    frames: usize,
}

impl Panel for FrameCounter {
    fn draw(&mut self, _width: u16, _height: u16, _pixels: &[u16]) {
        self.frames += 1;
    }
}

/// The simulated LDR is process-global; tests that set it take this lock.
static LIGHT: Mutex<()> = Mutex::new(());

fn ble_name() -> heapless::String<24> {
    let mut name = heapless::String::new();
    name.push_str("ESP32_Device").unwrap();
    name
}

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn full_stack_tick_drives_servo_buzzer_screen_and_ble() {
    let _light = LIGHT.lock().unwrap_or_else(|e| e.into_inner());
    static LINK: ConnectionState = ConnectionState::new();
    let config = SystemConfig::default();

    let mut bus = FakeBus::healthy();
    bus.touch[0x03] = 0b1111_1111;
    let mut hub = SensorHub::new(bus, NoDelay);
    hub.init().unwrap();

    let clock = ManualClock::default();
    let mut hw = HardwareAdapter::new(hub, ServoDriver::new(), BuzzerDriver::new(), clock.clone());
    let mut screen = TextConsole::new(FrameCounter::default(), 320, 240);
    let mut ble = BleAdapter::new(ble_name(), &LINK);
    ble.start().unwrap();
    ble.on_central_connected();
    let mut remote = MockReporter::new();
    let mut sink = LogEventSink::new();
    let fanout = Fanout::new(&LINK, config.buzzer_freq_hz, config.buzzer_duration_ms);
    let mut service = MonitorService::new(&config);

    // Dark room: light rule fires.
    light::sim_set_light_adc(100);
    let report = service.tick(&mut hw, &mut screen, &fanout, &mut ble, &mut remote, &mut sink);

    assert_eq!(report.touch_count, 8);
    assert_eq!(hw.servo().angle(), Some(180));
    assert_eq!(hw.servo().current_duty(), servo::duty_for_pulse(servo::MAX_PULSE_US));
    assert_eq!(report.alert.detail(), "Low light level!");
    assert_eq!(
        hw.buzzer().state(),
        BuzzerState::Sounding { freq_hz: 300, until_ms: 1000 }
    );
    assert_eq!(screen.panel().frames, 1);
    assert_eq!(
        ble.sim_sent(),
        [
            "Fan-lvl:8,LDR:100,Temp:25.00,Hum:50.00,X:0.00,Y:0.00,Z:1.00",
            "ALERT: Low light level!"
        ]
    );
    assert_eq!(remote.reports[1], (ReportStatus::Alert, "Low light level!".to_owned()));

    // One period later the tone has run out and the room is lit.
    clock.advance(1000);
    light::sim_set_light_adc(600);
    let report = service.tick(&mut hw, &mut screen, &fanout, &mut ble, &mut remote, &mut sink);

    assert!(!report.alert.triggered());
    assert!(!hw.buzzer().is_sounding());
    assert_eq!(screen.panel().frames, 2);
    assert_eq!(ble.sim_sent().len(), 3);
}

/// Endpoint that answers 200 after `cost_ms` of simulated time.
struct SlowReporter {
    clock: ManualClock,
    cost_ms: u64,
}

impl ReportPort for SlowReporter {
    fn report(&mut self, _status: ReportStatus, _info: &str) -> Result<u16, ReportError> {
        self.clock.advance(self.cost_ms);
        Ok(200)
    }
}

#[test]
fn tone_length_is_fixed_when_the_next_tick_runs_long() {
    let _light = LIGHT.lock().unwrap_or_else(|e| e.into_inner());
    static LINK: ConnectionState = ConnectionState::new();
    let config = SystemConfig::default();

    let mut hub = SensorHub::new(FakeBus::healthy(), NoDelay);
    hub.init().unwrap();
    let clock = ManualClock::default();
    clock.advance(2200);
    let mut hw = HardwareAdapter::new(hub, ServoDriver::new(), BuzzerDriver::new(), clock.clone());
    let mut screen = TextConsole::new(FrameCounter::default(), 320, 240);
    let mut ble = BleAdapter::new(ble_name(), &LINK);
    let mut sink = LogEventSink::new();
    let fanout = Fanout::new(&LINK, config.buzzer_freq_hz, config.buzzer_duration_ms);
    let mut service = MonitorService::new(&config);

    light::sim_set_light_adc(100);
    let mut fast = SlowReporter { clock: clock.clone(), cost_ms: 0 };
    service.tick(&mut hw, &mut screen, &fanout, &mut ble, &mut fast, &mut sink);
    assert!(hw.buzzer_sounding());

    // Overrun: the next tick starts at once and its report blocks for 3 s.
    light::sim_set_light_adc(600);
    let mut slow = SlowReporter { clock: clock.clone(), cost_ms: 3000 };
    service.tick(&mut hw, &mut screen, &fanout, &mut ble, &mut slow, &mut sink);

    assert_eq!(clock.now_ms(), 5200);
    assert!(!hw.buzzer_sounding());
    assert!(hw.buzzer().is_sounding_at(3199));
    assert!(!hw.buzzer().is_sounding_at(3200));
}

#[test]
fn missing_sensor_shows_init_error_screen() {
    let mut bus = FakeBus::healthy();
    bus.touch[0xFD] = 0x00;
    let mut hub = SensorHub::new(bus, NoDelay);
    let mut screen = TextConsole::new(FrameCounter::default(), 320, 240);

    let err = hub.init().unwrap_err();
    assert_eq!(err.to_string(), "init: CAP1188: device not responding");

    display::render_init_error(&mut screen);
    assert_eq!(screen.panel().frames, 1);
    let red = embedded_graphics::pixelcolor::raw::RawU16::from(display::ERROR_BACKGROUND).into_inner();
    assert_eq!(screen.framebuffer().pixel(0, 0), Some(red));
}

#[test]
fn ble_disconnect_silences_notifications() {
    static LINK: ConnectionState = ConnectionState::new();
    let config = SystemConfig::default();
    let fanout = Fanout::new(&LINK, config.buzzer_freq_hz, config.buzzer_duration_ms);

    let mut ble = BleAdapter::new(ble_name(), &LINK);
    ble.start().unwrap();
    ble.on_central_connected();
    ble.on_central_disconnected();

    assert!(!fanout.connection().is_connected());
    envmon::app::ports::NotifyPort::notify(&mut ble, "Fan-lvl:0");
    assert!(ble.sim_sent().is_empty());
}

#[test]
fn boot_config_and_credentials_from_nvs() {
    let nvs = NvsAdapter::new().unwrap();

    // Fresh flash: defaults, and no credentials is not fatal.
    assert_eq!(nvs.load().unwrap(), SystemConfig::default());
    assert_eq!(nvs.load_credentials(), Err(StorageError::NotFound));

    let mut cfg = SystemConfig::default();
    cfg.tick_interval_ms = 2000;
    nvs.save(&cfg).unwrap();
    assert_eq!(nvs.load().unwrap().tick_interval_ms, 2000);

    let mut creds = WifiCredentials::default();
    creds.ssid.push_str("HomeWiFi").unwrap();
    creds.password.push_str("mysecret8").unwrap();
    nvs.sim_put_credentials(&creds);
    assert_eq!(nvs.load_credentials().unwrap(), creds);
}
