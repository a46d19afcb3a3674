//! Actuation policy: what the fan and the indicator should show for a reading.
//!
//! Pure functions, recomputed from scratch for every reading. An unavailable
//! metric never satisfies a limit, so missing data leaves the fan off.

use aqmindp_sensor::Reading;

use crate::config::ThresholdConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanState {
    pub on: bool,
}

impl FanState {
    pub const ON: FanState = FanState { on: true };
    pub const OFF: FanState = FanState { on: false };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicatorColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl IndicatorColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const EXCELLENT: IndicatorColor = IndicatorColor::rgb(0, 0, 255);
    pub const GOOD: IndicatorColor = IndicatorColor::rgb(0, 255, 0);
    pub const MODERATE: IndicatorColor = IndicatorColor::rgb(125, 125, 0);
    pub const POOR: IndicatorColor = IndicatorColor::rgb(255, 60, 0);
    pub const UNHEALTHY: IndicatorColor = IndicatorColor::rgb(255, 0, 0);
    /// Shown when the AQI category is unknown
    pub const UNKNOWN: IndicatorColor = IndicatorColor::rgb(0, 0, 0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorKind {
    Fan,
    Indicator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    Fan(FanState),
    Indicator(IndicatorColor),
}

fn at_or_above(value: Option<i32>, limit: i32) -> bool {
    matches!(value, Some(v) if v >= limit)
}

pub fn evaluate_fan(reading: &Reading, thresholds: &ThresholdConfig) -> FanState {
    FanState {
        on: at_or_above(reading.tvoc, thresholds.tvoc_limit)
            || at_or_above(reading.eco2, thresholds.eco2_limit)
            || at_or_above(reading.aqi, thresholds.aqi_limit),
    }
}

/// Color for an AQI category. Defined for every input.
pub fn indicator_for_aqi(aqi: Option<i32>) -> IndicatorColor {
    match aqi {
        Some(1) => IndicatorColor::EXCELLENT,
        Some(2) => IndicatorColor::GOOD,
        Some(3) => IndicatorColor::MODERATE,
        Some(4) => IndicatorColor::POOR,
        Some(5) => IndicatorColor::UNHEALTHY,
        _ => IndicatorColor::UNKNOWN,
    }
}

pub fn evaluate(reading: &Reading, thresholds: &ThresholdConfig, kind: ActuatorKind) -> ActuatorCommand {
    match kind {
        ActuatorKind::Fan => ActuatorCommand::Fan(evaluate_fan(reading, thresholds)),
        ActuatorKind::Indicator => ActuatorCommand::Indicator(indicator_for_aqi(reading.aqi)),
    }
}

/// Commands for every actuator a node drives, fan first
pub fn evaluate_all(reading: &Reading, thresholds: &ThresholdConfig) -> [ActuatorCommand; 2] {
    [
        evaluate(reading, thresholds, ActuatorKind::Fan),
        evaluate(reading, thresholds, ActuatorKind::Indicator),
    ]
}
