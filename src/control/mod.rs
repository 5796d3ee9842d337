//! Control laws: pure functions from readings to actuator set-points.

pub mod fan;
