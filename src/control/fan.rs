//! Touch-to-fan mapping.
//!
//! The number of active CAP1188 channels selects the servo "fan level".
//! No touch parks the servo at its neutral angle; one to eight touches
//! sweep linearly from 0° to 180°, rounded to the nearest degree.

/// Highest servo angle in degrees.
pub const MAX_ANGLE: u8 = 180;
/// Number of capacitive channels on the touch controller.
pub const TOUCH_CHANNELS: u8 = 8;
/// Default parking angle when nothing is touched.
pub const NEUTRAL_ANGLE: u8 = 90;

/// Population count of the touch mask.
pub fn touch_count(mask: u8) -> u8 {
    mask.count_ones() as u8
}

/// Servo angle for `count` active channels.
///
/// `count == 0` yields `neutral`. Otherwise `round((count-1)/7 * 180)`,
/// computed in integers; `count` above 8 saturates at 180.
pub fn fan_angle(count: u8, neutral: u8) -> u8 {
    if count == 0 {
        return neutral.min(MAX_ANGLE);
    }
    let steps = u32::from(count.min(TOUCH_CHANNELS) - 1);
    let span = u32::from(TOUCH_CHANNELS - 1);
    // +span/2 rounds to nearest; span is odd so there are no exact halves.
    ((steps * u32::from(MAX_ANGLE) + span / 2) / span) as u8
}
