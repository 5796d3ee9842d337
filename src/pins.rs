//! GPIO / peripheral pin assignments for the EnvMon board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Sensors: analog (ADC1)
// ---------------------------------------------------------------------------

/// LDR light sensor in a divider to ADC1 channel 0 (GPIO 36, input-only).
pub const LDR_ADC_GPIO: i32 = 36;
/// ADC1 channel number for the LDR.
pub const LDR_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// Actuators (LEDC)
// ---------------------------------------------------------------------------

/// Fan-direction servo signal.
pub const SERVO_GPIO: i32 = 17;
/// Piezo buzzer, driven with a 50 % duty square wave.
pub const BUZZER_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// I²C bus (CAP1188, AHT20, LSM6DSO)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
/// Standard-mode bus; all three parts support 400 kHz but the wiring is long.
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// TFT (ST7789 over SPI2)
// ---------------------------------------------------------------------------

pub const TFT_MOSI_GPIO: i32 = 19;
pub const TFT_SCLK_GPIO: i32 = 18;
pub const TFT_CS_GPIO: i32 = 5;
pub const TFT_DC_GPIO: i32 = 16;
pub const TFT_RST_GPIO: i32 = 23;
pub const TFT_BL_GPIO: i32 = 4;
pub const TFT_SPI_FREQ_HZ: u32 = 40_000_000;

/// Panel size after rotation 1 (landscape).
pub const TFT_WIDTH: u16 = 320;
pub const TFT_HEIGHT: u16 = 240;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// Servo timer resolution (bits).  14-bit gives ~1.2 µs steps at 50 Hz.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// Buzzer timer resolution (bits).  Frequency is retuned per tone.
pub const BUZZER_PWM_RESOLUTION_BITS: u32 = 10;
