//! The result of analyzing one transcript.

use serde::{Deserialize, Serialize};

use crate::alert::RedFlag;
use crate::diagnostic::Diagnostic;
use crate::encounter::ClinicalEncounter;

/// Encounter, ranked red flags, and diagnostics for one transcript.
///
/// Created fresh per analysis; nothing here is shared between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub encounter: ClinicalEncounter,
    /// Sorted by severity descending, then confidence descending.
    pub red_flags: Vec<RedFlag>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}
