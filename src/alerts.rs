//! Threshold alert evaluator.
//!
//! Rules are checked in a fixed priority order and the first match wins;
//! a tick raises at most one alert and later rules are never consulted
//! once an earlier one has matched.
//!
//! | Order | Predicate                      | Message                     |
//! |-------|--------------------------------|-----------------------------|
//! | 1     | temperature < min              | `Low temperature!`          |
//! | 2     | humidity < min                 | `Low humidity!`             |
//! | 3     | accel X outside ±max           | `Abnormal X-axis motion!`   |
//! | 4     | accel Y outside ±max           | `Abnormal Y-axis motion!`   |
//! | 5     | accel Z < min                  | `Abnormal Z-axis motion!`   |
//! | 6     | light level < min              | `Low light level!`          |
//!
//! Float readings are widened to `f64` before comparison, so a reading of
//! exactly `0.3_f32` (which is slightly above 0.3) trips the X/Y rules.

use crate::app::snapshot::SensorSnapshot;
use crate::config::AlertThresholds;

/// One alert rule. Declaration order is evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    LowTemperature,
    LowHumidity,
    AbnormalX,
    AbnormalY,
    AbnormalZ,
    LowLight,
}

impl AlertKind {
    /// Every rule, highest priority first.
    pub const ALL: [AlertKind; 6] = [
        AlertKind::LowTemperature,
        AlertKind::LowHumidity,
        AlertKind::AbnormalX,
        AlertKind::AbnormalY,
        AlertKind::AbnormalZ,
        AlertKind::LowLight,
    ];

    /// Human-readable detail text sent to both sinks.
    pub const fn message(self) -> &'static str {
        match self {
            Self::LowTemperature => "Low temperature!",
            Self::LowHumidity => "Low humidity!",
            Self::AbnormalX => "Abnormal X-axis motion!",
            Self::AbnormalY => "Abnormal Y-axis motion!",
            Self::AbnormalZ => "Abnormal Z-axis motion!",
            Self::LowLight => "Low light level!",
        }
    }

    /// Whether this single rule's predicate holds for `snap`.
    pub fn matches(self, snap: &SensorSnapshot, t: &AlertThresholds) -> bool {
        match self {
            Self::LowTemperature => f64::from(snap.temperature_c) < t.min_temperature_c,
            Self::LowHumidity => f64::from(snap.humidity_pct) < t.min_humidity_pct,
            Self::AbnormalX => outside_band(snap.accel_x, t.max_abs_accel_x),
            Self::AbnormalY => outside_band(snap.accel_y, t.max_abs_accel_y),
            Self::AbnormalZ => f64::from(snap.accel_z) < t.min_accel_z,
            Self::LowLight => snap.light_level < t.min_light_level,
        }
    }
}

fn outside_band(value: f32, limit: f64) -> bool {
    let v = f64::from(value);
    v < -limit || v > limit
}

/// Outcome of one evaluation: either no alert or exactly one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertResult {
    kind: Option<AlertKind>,
}

impl AlertResult {
    pub const NONE: Self = Self { kind: None };

    pub fn triggered(&self) -> bool {
        self.kind.is_some()
    }

    /// The matching rule's message, or `""` when nothing fired.
    pub fn detail(&self) -> &'static str {
        self.kind.map_or("", AlertKind::message)
    }

    pub fn kind(&self) -> Option<AlertKind> {
        self.kind
    }
}

impl From<AlertKind> for AlertResult {
    fn from(kind: AlertKind) -> Self {
        Self { kind: Some(kind) }
    }
}

/// Pure, stateless evaluator over a configurable threshold set.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
}

impl AlertEvaluator {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Return the first rule (in priority order) whose predicate holds.
    pub fn evaluate(&self, snap: &SensorSnapshot) -> AlertResult {
        AlertKind::ALL
            .into_iter()
            .find(|rule| rule.matches(snap, &self.thresholds))
            .map_or(AlertResult::NONE, AlertResult::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nominal() -> SensorSnapshot {
        SensorSnapshot {
            touch_mask: 0,
            light_level: 500,
            temperature_c: 20.0,
            humidity_pct: 50.0,
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: 1.0,
        }
    }

    fn eval(snap: &SensorSnapshot) -> AlertResult {
        AlertEvaluator::default().evaluate(snap)
    }

    #[test]
    fn nominal_snapshot_raises_nothing() {
        let r = eval(&nominal());
        assert!(!r.triggered());
        assert_eq!(r.detail(), "");
        assert_eq!(r.kind(), None);
    }

    #[test]
    fn low_temperature_wins_alone() {
        let snap = SensorSnapshot { temperature_c: 3.0, ..nominal() };
        let r = eval(&snap);
        assert!(r.triggered());
        assert_eq!(r.detail(), "Low temperature!");
    }

    #[test]
    fn x_axis_rule_when_climate_is_fine() {
        let snap = SensorSnapshot { accel_x: 0.5, ..nominal() };
        assert_eq!(eval(&snap).detail(), "Abnormal X-axis motion!");
    }

    #[test]
    fn negative_x_also_trips() {
        let snap = SensorSnapshot { accel_x: -0.31, ..nominal() };
        assert_eq!(eval(&snap).kind(), Some(AlertKind::AbnormalX));
    }

    #[test]
    fn temperature_beats_every_other_rule() {
        let snap = SensorSnapshot {
            touch_mask: 0,
            light_level: 0,
            temperature_c: -10.0,
            humidity_pct: 0.0,
            accel_x: 2.0,
            accel_y: 2.0,
            accel_z: -1.0,
        };
        assert_eq!(eval(&snap).kind(), Some(AlertKind::LowTemperature));
    }

    #[test]
    fn humidity_beats_motion_and_light() {
        let snap = SensorSnapshot {
            humidity_pct: 1.0,
            accel_y: 1.0,
            light_level: 10,
            ..nominal()
        };
        assert_eq!(eval(&snap).detail(), "Low humidity!");
    }

    #[test]
    fn z_axis_rule_is_one_sided() {
        let high = SensorSnapshot { accel_z: 3.0, ..nominal() };
        assert!(!eval(&high).triggered());
        let low = SensorSnapshot { accel_z: 0.5, ..nominal() };
        assert_eq!(eval(&low).kind(), Some(AlertKind::AbnormalZ));
    }

    #[test]
    fn low_light_is_last_resort() {
        let snap = SensorSnapshot { light_level: 149, ..nominal() };
        assert_eq!(eval(&snap).detail(), "Low light level!");
        let edge = SensorSnapshot { light_level: 150, ..nominal() };
        assert!(!eval(&edge).triggered());
    }

    #[test]
    fn threshold_edges_are_strict() {
        let snap = SensorSnapshot {
            temperature_c: 5.0,
            humidity_pct: 5.0,
            ..nominal()
        };
        assert!(!eval(&snap).triggered());
    }

    #[test]
    fn f32_point_three_is_above_the_band() {
        let snap = SensorSnapshot { accel_y: 0.3, ..nominal() };
        assert_eq!(eval(&snap).kind(), Some(AlertKind::AbnormalY));
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let evaluator = AlertEvaluator::new(AlertThresholds {
            min_light_level: 600,
            ..AlertThresholds::default()
        });
        assert_eq!(evaluator.evaluate(&nominal()).kind(), Some(AlertKind::LowLight));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let snap = SensorSnapshot { humidity_pct: 2.0, ..nominal() };
        let ev = AlertEvaluator::default();
        assert_eq!(ev.evaluate(&snap), ev.evaluate(&snap));
    }
}
