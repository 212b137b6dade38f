//! Non-fatal analysis diagnostics.
//!
//! The pipeline is a best-effort extractor. Conditions that would be errors
//! in a validator are reported here instead so the caller can judge how
//! complete an analysis is.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vitals::VitalKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A field could not be extracted and will render as a placeholder.
    MissingField { field: String },

    /// A vital was captured outside plausibility bounds and kept as-is.
    OutOfRangeValue { vital: VitalKind, value: f64 },

    /// A symptom was both affirmed and denied; the last mention decided it.
    AmbiguousPolarity { term: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingField { field } => write!(f, "missing field: {field}"),
            Diagnostic::OutOfRangeValue { vital, value } => {
                write!(f, "{vital} {value} is outside plausible bounds; verify")
            }
            Diagnostic::AmbiguousPolarity { term } => {
                write!(f, "'{term}' was both affirmed and denied; last mention used")
            }
        }
    }
}
