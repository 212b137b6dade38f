//! Vital signs with plausibility flags.
//!
//! A reading outside physiologic bounds is kept exactly as captured and
//! marked `needs_verification`. Values are never corrected or dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of vital sign the validator knows bounds for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalKind {
    Systolic,
    Diastolic,
    HeartRate,
    Temperature,
    RespiratoryRate,
    OxygenSaturation,
}

impl VitalKind {
    /// Inclusive plausibility bounds `(low, high)`.
    ///
    /// Temperature is in °F, oxygen saturation in percent.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            VitalKind::Systolic => (70.0, 250.0),
            VitalKind::Diastolic => (40.0, 150.0),
            VitalKind::HeartRate => (40.0, 180.0),
            VitalKind::Temperature => (95.0, 106.0),
            VitalKind::RespiratoryRate => (8.0, 35.0),
            VitalKind::OxygenSaturation => (70.0, 100.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VitalKind::Systolic => "systolic blood pressure",
            VitalKind::Diastolic => "diastolic blood pressure",
            VitalKind::HeartRate => "heart rate",
            VitalKind::Temperature => "temperature",
            VitalKind::RespiratoryRate => "respiratory rate",
            VitalKind::OxygenSaturation => "oxygen saturation",
        }
    }
}

impl fmt::Display for VitalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single validated reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalReading {
    pub value: f64,
    pub needs_verification: bool,
}

/// Blood pressure; flagged when either component is out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
    pub needs_verification: bool,
}

/// All vitals captured from a transcript. Each is independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub heart_rate: Option<VitalReading>,
    pub blood_pressure: Option<BloodPressure>,
    pub temperature: Option<VitalReading>,
    pub respiratory_rate: Option<VitalReading>,
    pub oxygen_saturation: Option<VitalReading>,
}

impl Vitals {
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.blood_pressure.is_none()
            && self.temperature.is_none()
            && self.respiratory_rate.is_none()
            && self.oxygen_saturation.is_none()
    }

    /// The reading for `kind`, with blood pressure split into its components.
    pub fn reading(&self, kind: VitalKind) -> Option<VitalReading> {
        match kind {
            VitalKind::Systolic => self.blood_pressure.map(|bp| VitalReading {
                value: bp.systolic,
                needs_verification: bp.needs_verification,
            }),
            VitalKind::Diastolic => self.blood_pressure.map(|bp| VitalReading {
                value: bp.diastolic,
                needs_verification: bp.needs_verification,
            }),
            VitalKind::HeartRate => self.heart_rate,
            VitalKind::Temperature => self.temperature,
            VitalKind::RespiratoryRate => self.respiratory_rate,
            VitalKind::OxygenSaturation => self.oxygen_saturation,
        }
    }
}

/// Format a vital value without a trailing `.0` for whole numbers.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
