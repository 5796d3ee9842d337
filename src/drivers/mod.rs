//! Actuator drivers, display plumbing, and hardware initialisation.

pub mod buzzer;
pub mod framebuffer;
pub mod hw_init;
pub mod servo;
#[cfg(target_os = "espidf")]
pub mod tft;
