//! Polarity of a term within a transcript.

use serde::{Deserialize, Serialize};

/// Outcome of resolving a term against a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// The term occurs and is affirmed.
    Present,
    /// The term occurs within the scope of a negation cue.
    Denied,
    /// The term does not occur at all.
    Unknown,
}

impl Polarity {
    pub fn is_present(self) -> bool {
        self == Polarity::Present
    }

    pub fn is_denied(self) -> bool {
        self == Polarity::Denied
    }
}
