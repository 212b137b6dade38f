//! The structured clinical encounter produced by one analysis.
//!
//! An encounter is built fresh for every transcript and never mutated after
//! the analyzer hands it back. Symptom and history collections are ordered
//! sets so repeated analyses of the same transcript compare equal.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::medication::{Allergy, Medication};
use crate::vitals::Vitals;

/// Chief complaint used when neither a narrative trigger nor a canonical
/// complaint is found in the transcript.
pub const UNCLEAR_CHIEF_COMPLAINT: &str = "unclear chief complaint";

/// Direction of symptom change over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Progression {
    Worsening,
    Improving,
    Stable,
    /// Progression vocabulary was present but only in negated form.
    Unknown,
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Progression::Worsening => "worsening",
            Progression::Improving => "improving",
            Progression::Stable => "stable",
            Progression::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// When the complaint began and how it has changed since.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    /// Onset phrase as spoken, e.g. "started about 2 hours ago".
    pub onset: Option<String>,
    pub progression: Option<Progression>,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.onset.is_none() && self.progression.is_none()
    }
}

/// Everything extracted from a single transcript.
///
/// `associated_symptoms` and `pertinent_negatives` are disjoint: each expected
/// symptom lands in at most one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalEncounter {
    /// A single chosen complaint, or [`UNCLEAR_CHIEF_COMPLAINT`].
    pub chief_complaint: String,
    /// Qualifiers in fixed order, each formatted as `"<kind>: <value>"`.
    pub characteristics: Vec<String>,
    pub timeline: Timeline,
    pub associated_symptoms: BTreeSet<String>,
    pub pertinent_negatives: BTreeSet<String>,
    /// Symptoms mentioned both affirmed and denied; final placement follows
    /// the last mention.
    #[serde(default)]
    pub conflicting_mentions: BTreeSet<String>,
    pub medical_history: BTreeSet<String>,
    pub medications: Vec<Medication>,
    pub allergies: Vec<Allergy>,
    /// Set when the transcript explicitly states no known allergies.
    #[serde(default)]
    pub no_known_allergies: bool,
    pub vitals: Option<Vitals>,
}

impl ClinicalEncounter {
    /// An encounter with nothing extracted.
    pub fn unclear() -> Self {
        Self {
            chief_complaint: UNCLEAR_CHIEF_COMPLAINT.to_string(),
            characteristics: Vec::new(),
            timeline: Timeline::default(),
            associated_symptoms: BTreeSet::new(),
            pertinent_negatives: BTreeSet::new(),
            conflicting_mentions: BTreeSet::new(),
            medical_history: BTreeSet::new(),
            medications: Vec::new(),
            allergies: Vec::new(),
            no_known_allergies: false,
            vitals: None,
        }
    }

    pub fn has_clear_complaint(&self) -> bool {
        self.chief_complaint != UNCLEAR_CHIEF_COMPLAINT
    }

    /// Look up a characteristic by kind, e.g. `characteristic("severity")`.
    pub fn characteristic(&self, kind: &str) -> Option<&str> {
        self.characteristics.iter().find_map(|c| {
            c.strip_prefix(kind)
                .and_then(|rest| rest.strip_prefix(": "))
        })
    }
}
