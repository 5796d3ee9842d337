//! Piezo buzzer driver.
//!
//! A tone is a 50 % duty square wave on LEDC ch1 at the requested
//! frequency.  [`BuzzerDriver::start`] never blocks.  The tone ends at
//! `start + duration` regardless of what the tick loop is doing:
//!
//! - **ESP-IDF**: a one-shot `esp_timer` armed by `start` zeroes the duty
//!   from the timer task.
//! - **host/test**: the deadline is the simulated one-shot; the output
//!   level is a function of time, see [`BuzzerDriver::is_sounding_at`].
//!
//! [`BuzzerDriver::poll`] only brings the recorded state in line with the
//! output after the deadline.  If the timer could not be created it is
//! also what silences the tone, one tick late.

use log::warn;

use crate::drivers::hw_init;
use crate::pins;

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicPtr, Ordering};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const HALF_DUTY: u32 = 1 << (pins::BUZZER_PWM_RESOLUTION_BITS - 1);

#[cfg(target_os = "espidf")]
static STOP_TIMER: AtomicPtr<esp_timer> = AtomicPtr::new(core::ptr::null_mut());

#[cfg(target_os = "espidf")]
unsafe extern "C" fn stop_tone_cb(_arg: *mut core::ffi::c_void) {
    hw_init::ledc_set(hw_init::LEDC_CH_BUZZER, 0);
}

/// Create the one-shot stop timer.  Runs once; later calls are no-ops.
#[cfg(target_os = "espidf")]
fn create_stop_timer() {
    if !STOP_TIMER.load(Ordering::Acquire).is_null() {
        return;
    }
    let args = esp_timer_create_args_t {
        callback: Some(stop_tone_cb),
        arg: core::ptr::null_mut(),
        dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
        name: b"buzzer\0".as_ptr().cast(),
        skip_unhandled_events: false,
    };
    let mut handle: esp_timer_handle_t = core::ptr::null_mut();
    // SAFETY: args and its name outlive the call; the callback only
    // writes the buzzer LEDC duty.
    let ret = unsafe { esp_timer_create(&args, &mut handle) };
    if ret != ESP_OK {
        log::error!("buzzer: stop timer create failed (rc={}), tones end on the next tick", ret);
        return;
    }
    STOP_TIMER.store(handle, Ordering::Release);
}

/// (Re)arm the stop timer.  Returns `false` when there is no timer.
#[cfg(target_os = "espidf")]
fn arm_stop(duration_ms: u32) -> bool {
    let timer = STOP_TIMER.load(Ordering::Acquire);
    if timer.is_null() {
        return false;
    }
    // SAFETY: timer is a live handle from create_stop_timer().  Stopping an
    // idle timer returns ESP_ERR_INVALID_STATE, which is fine.
    unsafe {
        esp_timer_stop(timer);
        esp_timer_start_once(timer, u64::from(duration_ms) * 1_000) == ESP_OK
    }
}

#[cfg(target_os = "espidf")]
fn disarm_stop() {
    let timer = STOP_TIMER.load(Ordering::Acquire);
    if !timer.is_null() {
        // SAFETY: see arm_stop().
        unsafe {
            esp_timer_stop(timer);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn create_stop_timer() {}

#[cfg(not(target_os = "espidf"))]
fn arm_stop(_duration_ms: u32) -> bool {
    true
}

#[cfg(not(target_os = "espidf"))]
fn disarm_stop() {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerState {
    Silent,
    Sounding { freq_hz: u32, until_ms: u64 },
}

pub struct BuzzerDriver {
    state: BuzzerState,
}

impl BuzzerDriver {
    pub fn new() -> Self {
        create_stop_timer();
        Self {
            state: BuzzerState::Silent,
        }
    }

    /// Begin a tone.  A tone already sounding is replaced.
    pub fn start(&mut self, freq_hz: u32, duration_ms: u32, now_ms: u64) {
        if freq_hz == 0 || duration_ms == 0 {
            self.stop();
            return;
        }
        if !hw_init::buzzer_set_freq(freq_hz) {
            warn!("buzzer: cannot tune to {} Hz", freq_hz);
            return;
        }
        hw_init::ledc_set(hw_init::LEDC_CH_BUZZER, HALF_DUTY);
        if !arm_stop(duration_ms) {
            warn!("buzzer: no stop timer, tone ends on the next poll");
        }
        self.state = BuzzerState::Sounding {
            freq_hz,
            until_ms: now_ms + u64::from(duration_ms),
        };
    }

    /// Record the end of a tone whose deadline has passed.
    pub fn poll(&mut self, now_ms: u64) {
        if let BuzzerState::Sounding { until_ms, .. } = self.state {
            if now_ms >= until_ms {
                self.stop();
            }
        }
    }

    pub fn stop(&mut self) {
        disarm_stop();
        hw_init::ledc_set(hw_init::LEDC_CH_BUZZER, 0);
        self.state = BuzzerState::Silent;
    }

    /// Last recorded state; may still read `Sounding` past the deadline
    /// until the next [`poll`](Self::poll).
    pub fn state(&self) -> BuzzerState {
        self.state
    }

    pub fn is_sounding(&self) -> bool {
        matches!(self.state, BuzzerState::Sounding { .. })
    }

    /// Whether the output is driven at `now_ms`.
    pub fn is_sounding_at(&self, now_ms: u64) -> bool {
        match self.state {
            BuzzerState::Sounding { until_ms, .. } => now_ms < until_ms,
            BuzzerState::Silent => false,
        }
    }
}

impl Default for BuzzerDriver {
    fn default() -> Self {
        Self::new()
    }
}
