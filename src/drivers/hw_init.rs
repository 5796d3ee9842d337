//! One-shot hardware peripheral initialization.
//!
//! Configures the LDR ADC channel and the two LEDC timers/channels (servo
//! and buzzer) using raw ESP-IDF sys calls. Called once from `main()`
//! before the tick loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    LedcInitFailed(i32),
    LcdInitFailed(&'static str, i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)  => write!(f, "ADC1 init failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::LcdInitFailed(step, rc) => write!(f, "LCD {} failed (rc={})", step, rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

pub const LEDC_CH_SERVO: u32 = 0;
pub const LEDC_CH_BUZZER: u32 = 1;

#[cfg(target_os = "espidf")]
const LEDC_TIMER_SERVO: u32 = 0;
#[cfg(target_os = "espidf")]
const LEDC_TIMER_BUZZER: u32 = 1;

/// Idle frequency for the buzzer timer; the channel sits at 0 % duty.
#[cfg(target_os = "espidf")]
const BUZZER_IDLE_FREQ_HZ: u32 = 1_000;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the tick loop; single-threaded.
    unsafe {
        init_adc()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// tick-loop ADC read path.  `init_adc()` completes before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    // 12 dB attenuation covers the full 0 – 3.3 V divider swing.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), pins::LDR_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!("hw_init: ADC1 configured (CH{}=LDR, GPIO {})", pins::LDR_ADC_CHANNEL, pins::LDR_ADC_GPIO);
    Ok(())
}

/// One 12-bit conversion.  A failed read returns 0.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded tick-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.clamp(0, 4095) as u16
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t) -> Result<(), HwInitError> {
    if ret == ESP_OK as i32 { Ok(()) } else { Err(HwInitError::LedcInitFailed(ret)) }
}

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: servo (50 Hz, 14-bit)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: LEDC_TIMER_SERVO,
        duty_resolution: pins::SERVO_PWM_RESOLUTION_BITS,
        freq_hz: pins::SERVO_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: Called from single main-task context via init_peripherals().
    check(unsafe { ledc_timer_config(&timer0) })?;

    // Timer 1: buzzer (retuned per tone, 10-bit)
    let timer1 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: LEDC_TIMER_BUZZER,
        duty_resolution: pins::BUZZER_PWM_RESOLUTION_BITS,
        freq_hz: BUZZER_IDLE_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    check(unsafe { ledc_timer_config(&timer1) })?;

    check(unsafe { ledc_channel_config(&ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: LEDC_CH_SERVO,
        timer_sel: LEDC_TIMER_SERVO,
        gpio_num: pins::SERVO_GPIO,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    }) })?;

    check(unsafe { ledc_channel_config(&ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: LEDC_CH_BUZZER,
        timer_sel: LEDC_TIMER_BUZZER,
        gpio_num: pins::BUZZER_GPIO,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    }) })?;

    info!("hw_init: LEDC configured (servo=CH0 @50Hz, buzzer=CH1)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u32) {
    // SAFETY: LEDC channels were configured in init_ledc().  Callers are the
    // tick loop and the buzzer stop timer; the LEDC driver serialises duty
    // updates with its own spinlock.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u32) {}

/// Retune the buzzer timer.  Returns `false` if the clock cannot reach `freq_hz`.
#[cfg(target_os = "espidf")]
pub fn buzzer_set_freq(freq_hz: u32) -> bool {
    // SAFETY: timer 1 was configured in init_ledc(); tick-loop only.
    unsafe { ledc_set_freq(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_TIMER_BUZZER, freq_hz) == ESP_OK as i32 }
}

#[cfg(not(target_os = "espidf"))]
pub fn buzzer_set_freq(_freq_hz: u32) -> bool {
    true
}
