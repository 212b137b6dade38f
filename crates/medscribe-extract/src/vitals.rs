//! Vital sign capture and plausibility validation.
//!
//! Patterns are compiled once and matched against the normalized transcript.
//! The first mention of each vital wins. A capture that does not parse as a
//! number is dropped; a capture outside physiologic bounds is kept and
//! flagged for verification.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use medscribe_contracts::vitals::{BloodPressure, VitalKind, VitalReading, Vitals};

/// Words allowed between a vital's label and its value ("bp is 120/80").
const LINK: &str = r"(?:\s*(?:is|was|of|at|reading|measured|:))*\s*";

static BP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:bp|blood pressure){LINK}(\d{{2,3}})\s*(?:/|over)\s*(\d{{2,3}})\b"
    ))
    .expect("blood pressure pattern")
});

static HR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:hr|heart rate|pulse){LINK}(\d{{2,3}})\b"))
        .expect("heart rate pattern")
});

static TEMP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:temp|temperature|febrile to|fever of|fever to){LINK}(\d{{2,3}}(?:\.\d)?)\b"
    ))
    .expect("temperature pattern")
});

static RR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:rr|respiratory rate|resp rate|respirations|breathing rate){LINK}(\d{{1,2}})\b"
    ))
    .expect("respiratory rate pattern")
});

static SPO2_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:spo2|o2 sats?|oxygen saturation|oxygen sat|sats?|pulse ox|satting|saturating){LINK}(\d{{2,3}})\b"
    ))
    .expect("oxygen saturation pattern")
});

/// Check `value` against the fixed bounds for `kind`.
///
/// The value is returned unchanged; only the flag depends on the bounds.
pub fn validate(value: f64, kind: VitalKind) -> VitalReading {
    let (low, high) = kind.bounds();
    let needs_verification = value < low || value > high;
    if needs_verification {
        warn!(vital = %kind, "vital outside plausible bounds");
    }
    VitalReading { value, needs_verification }
}

/// Validate both components; the reading is flagged if either is out of range.
pub fn validate_blood_pressure(systolic: f64, diastolic: f64) -> BloodPressure {
    let sys = validate(systolic, VitalKind::Systolic);
    let dia = validate(diastolic, VitalKind::Diastolic);
    BloodPressure {
        systolic,
        diastolic,
        needs_verification: sys.needs_verification || dia.needs_verification,
    }
}

/// Capture every vital mentioned in normalized `text`.
///
/// Returns `None` when no vital is mentioned at all.
pub fn extract_vitals(text: &str) -> Option<Vitals> {
    let vitals = Vitals {
        heart_rate: capture(&HR_PATTERN, text).map(|v| validate(v, VitalKind::HeartRate)),
        blood_pressure: capture_blood_pressure(text),
        temperature: capture(&TEMP_PATTERN, text).map(|v| validate(v, VitalKind::Temperature)),
        respiratory_rate: capture(&RR_PATTERN, text)
            .map(|v| validate(v, VitalKind::RespiratoryRate)),
        oxygen_saturation: capture(&SPO2_PATTERN, text)
            .map(|v| validate(v, VitalKind::OxygenSaturation)),
    };
    if vitals.is_empty() {
        return None;
    }
    debug!(
        heart_rate = vitals.heart_rate.is_some(),
        blood_pressure = vitals.blood_pressure.is_some(),
        temperature = vitals.temperature.is_some(),
        respiratory_rate = vitals.respiratory_rate.is_some(),
        oxygen_saturation = vitals.oxygen_saturation.is_some(),
        "vitals captured"
    );
    Some(vitals)
}

fn capture(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn capture_blood_pressure(text: &str) -> Option<BloodPressure> {
    let caps = BP_PATTERN.captures(text)?;
    let systolic: f64 = caps.get(1)?.as_str().parse().ok()?;
    let diastolic: f64 = caps.get(2)?.as_str().parse().ok()?;
    Some(validate_blood_pressure(systolic, diastolic))
}

// ── Tests ────────────────────────────────────────────────────────────────────
