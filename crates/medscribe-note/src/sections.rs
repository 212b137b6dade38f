//! Section content shared by every note format.
//!
//! Each builder returns the lines for one section. A section with nothing
//! extracted yields the single placeholder line [`NOT_DISCUSSED`]; builders
//! never invent content that is not in their inputs.

use medscribe_contracts::{
    alert::RedFlag,
    encounter::ClinicalEncounter,
    medication::{Allergy, Medication, Origin},
    note::NOT_DISCUSSED,
    vitals::{format_value, VitalReading, Vitals},
};

/// Rendered when the transcript explicitly states no known allergies.
pub const NO_KNOWN_ALLERGIES: &str = "No known drug allergies";

/// Suffix on a vital value outside plausibility bounds.
pub const VERIFY_SUFFIX: &str = " (verify)";

/// `lines`, or the placeholder when empty.
pub fn or_placeholder(lines: Vec<String>) -> Vec<String> {
    if lines.is_empty() {
        vec![NOT_DISCUSSED.to_string()]
    } else {
        lines
    }
}

/// Items joined with commas, or the placeholder.
pub fn join_or_placeholder<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        NOT_DISCUSSED.to_string()
    } else {
        joined
    }
}

/// The chief complaint verbatim, including the unclear marker.
pub fn chief_complaint(encounter: &ClinicalEncounter) -> String {
    encounter.chief_complaint.clone()
}

/// Characteristics, onset and progression, one per line.
pub fn history_of_present_illness(encounter: &ClinicalEncounter) -> Vec<String> {
    let mut lines: Vec<String> = encounter
        .characteristics
        .iter()
        .map(|c| capitalize(c))
        .collect();
    if let Some(onset) = &encounter.timeline.onset {
        lines.push(format!("Onset: {onset}"));
    }
    if let Some(progression) = encounter.timeline.progression {
        lines.push(format!("Progression: {progression}"));
    }
    or_placeholder(lines)
}

pub fn associated_symptoms(encounter: &ClinicalEncounter) -> String {
    join_or_placeholder(&encounter.associated_symptoms)
}

pub fn pertinent_negatives(encounter: &ClinicalEncounter) -> String {
    join_or_placeholder(&encounter.pertinent_negatives)
}

pub fn medical_history(encounter: &ClinicalEncounter) -> String {
    join_or_placeholder(&encounter.medical_history)
}

/// One line per medication in charting form, tagged with its origin when
/// known.
pub fn medications(medications: &[Medication]) -> Vec<String> {
    or_placeholder(
        medications
            .iter()
            .map(|m| match m.origin {
                Origin::Unspecified => m.to_string(),
                origin => format!("{m} [{origin}]"),
            })
            .collect(),
    )
}

/// One line per allergy; an explicit no-known-allergies statement is shown
/// when no allergy was captured.
pub fn allergies(encounter: &ClinicalEncounter, allergies: &[Allergy]) -> Vec<String> {
    if allergies.is_empty() && encounter.no_known_allergies {
        return vec![NO_KNOWN_ALLERGIES.to_string()];
    }
    or_placeholder(allergies.iter().map(ToString::to_string).collect())
}

/// Vital sign lines with units; implausible values keep their captured
/// value and are marked for verification.
pub fn vitals(vitals: Option<&Vitals>) -> Vec<String> {
    let Some(v) = vitals else {
        return or_placeholder(Vec::new());
    };
    let mut lines = Vec::new();
    if let Some(bp) = v.blood_pressure {
        lines.push(format!(
            "BP: {}/{} mmHg{}",
            format_value(bp.systolic),
            format_value(bp.diastolic),
            verify_suffix(bp.needs_verification)
        ));
    }
    let readings: [(&str, Option<VitalReading>, &str); 4] = [
        ("HR", v.heart_rate, " bpm"),
        ("Temp", v.temperature, " F"),
        ("RR", v.respiratory_rate, " breaths/min"),
        ("SpO2", v.oxygen_saturation, "%"),
    ];
    for (label, reading, unit) in readings {
        if let Some(r) = reading {
            lines.push(format!(
                "{label}: {}{unit}{}",
                format_value(r.value),
                verify_suffix(r.needs_verification)
            ));
        }
    }
    or_placeholder(lines)
}

/// The distinguished alert block placed above every note. Empty when there
/// are no alerts.
pub fn red_flag_block(flags: &[RedFlag]) -> Vec<String> {
    if flags.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["*** RED FLAGS ***".to_string()];
    for flag in flags {
        lines.push(format!(
            "[{}] {} (confidence {}%)",
            flag.severity,
            flag.category,
            flag.confidence_percent()
        ));
        lines.push(format!("  Findings: {}", join_or_placeholder(&flag.matched_findings)));
        lines.push(format!("  Recommendation: {}", flag.recommendation));
    }
    lines.push("*** END RED FLAGS ***".to_string());
    lines
}

/// Assessment derived only from fired rule-sets.
pub fn assessment(flags: &[RedFlag]) -> Vec<String> {
    or_placeholder(
        flags
            .iter()
            .map(|f| {
                format!(
                    "Concern for {} ({}, confidence {}%): {}",
                    f.category,
                    f.severity,
                    f.confidence_percent(),
                    join_or_placeholder(&f.matched_findings)
                )
            })
            .collect(),
    )
}

/// Plan derived only from fired rule-set recommendations.
pub fn plan(flags: &[RedFlag]) -> Vec<String> {
    or_placeholder(
        flags
            .iter()
            .map(|f| format!("{}: {}", f.category, f.recommendation))
            .collect(),
    )
}

fn verify_suffix(needs_verification: bool) -> &'static str {
    if needs_verification {
        VERIFY_SUFFIX
    } else {
        ""
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
