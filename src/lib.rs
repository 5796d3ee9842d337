//! EnvMon firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alerts;
pub mod app;
pub mod boot;
pub mod config;
pub mod control;
pub mod display;
pub mod error;
pub mod fanout;
pub mod pins;
pub mod scheduler;
pub mod telemetry;

// Hardware-facing modules carry both a device and a host implementation
// selected by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
