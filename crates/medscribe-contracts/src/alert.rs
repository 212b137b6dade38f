//! Red-flag safety alerts.
//!
//! A red flag is the output of one rule-set that cleared its firing
//! threshold. Lists of red flags are always ordered by severity (most severe
//! first), then confidence (highest first); see [`sort_red_flags`].

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed set of time-critical conditions the detector screens for.
///
/// Declaration order is the final tie-breaker when sorting alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlagCategory {
    Stemi,
    Stroke,
    SubarachnoidHemorrhage,
    AorticDissection,
    PulmonaryEmbolism,
    Sepsis,
    RupturedAaa,
    Meningitis,
    BowelPerforation,
    Dka,
    Anaphylaxis,
    StatusAsthmaticus,
    GiBleed,
    StatusEpilepticus,
    AcuteAbdomen,
}

impl RedFlagCategory {
    pub const ALL: [RedFlagCategory; 15] = [
        RedFlagCategory::Stemi,
        RedFlagCategory::Stroke,
        RedFlagCategory::SubarachnoidHemorrhage,
        RedFlagCategory::AorticDissection,
        RedFlagCategory::PulmonaryEmbolism,
        RedFlagCategory::Sepsis,
        RedFlagCategory::RupturedAaa,
        RedFlagCategory::Meningitis,
        RedFlagCategory::BowelPerforation,
        RedFlagCategory::Dka,
        RedFlagCategory::Anaphylaxis,
        RedFlagCategory::StatusAsthmaticus,
        RedFlagCategory::GiBleed,
        RedFlagCategory::StatusEpilepticus,
        RedFlagCategory::AcuteAbdomen,
    ];

    /// Display name used in rendered notes.
    pub fn display_name(self) -> &'static str {
        match self {
            RedFlagCategory::Stemi => "STEMI",
            RedFlagCategory::Stroke => "Stroke",
            RedFlagCategory::SubarachnoidHemorrhage => "Subarachnoid hemorrhage",
            RedFlagCategory::AorticDissection => "Aortic dissection",
            RedFlagCategory::PulmonaryEmbolism => "Pulmonary embolism",
            RedFlagCategory::Sepsis => "Sepsis / septic shock",
            RedFlagCategory::RupturedAaa => "Ruptured AAA",
            RedFlagCategory::Meningitis => "Meningitis",
            RedFlagCategory::BowelPerforation => "Bowel perforation",
            RedFlagCategory::Dka => "Diabetic ketoacidosis",
            RedFlagCategory::Anaphylaxis => "Anaphylaxis",
            RedFlagCategory::StatusAsthmaticus => "Status asthmaticus",
            RedFlagCategory::GiBleed => "GI bleeding",
            RedFlagCategory::StatusEpilepticus => "Status epilepticus",
            RedFlagCategory::AcuteAbdomen => "Acute surgical abdomen",
        }
    }
}

impl fmt::Display for RedFlagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Alert severity. Ordered so that `Critical` compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Urgent,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertSeverity::Warning => "WARNING",
            AlertSeverity::Urgent => "URGENT",
            AlertSeverity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// One fired rule-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    pub category: RedFlagCategory,
    pub severity: AlertSeverity,
    /// Matched weight over total weight, clamped to `[0, 1]`.
    pub confidence: f64,
    /// Labels of the matched findings, in rule-set declaration order.
    pub matched_findings: Vec<String>,
    pub recommendation: String,
}

impl RedFlag {
    /// Confidence as a whole percentage, for display.
    pub fn confidence_percent(&self) -> u32 {
        // Confidence is clamped to [0, 1], so the product fits in u32.
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// Order two alerts: severity descending, confidence descending, then
/// category declaration order.
pub fn rank(a: &RedFlag, b: &RedFlag) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.category.cmp(&b.category))
}

/// Sort alerts into their canonical presentation order.
pub fn sort_red_flags(flags: &mut [RedFlag]) {
    flags.sort_by(rank);
}

/// True if `flags` is already in canonical order.
pub fn is_ranked(flags: &[RedFlag]) -> bool {
    flags.windows(2).all(|w| rank(&w[0], &w[1]) != Ordering::Greater)
}
