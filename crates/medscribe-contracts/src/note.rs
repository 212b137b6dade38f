//! Note formats understood by the assembler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MedscribeError;

/// Placeholder rendered for any section or field with no extracted content.
pub const NOT_DISCUSSED: &str = "Not discussed";

/// The rendered layout of a clinical note. Section order is fixed per format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteFormat {
    Soap,
    EdNote,
    Narrative,
    Structured,
    Differential,
}

impl NoteFormat {
    pub const ALL: [NoteFormat; 5] = [
        NoteFormat::Soap,
        NoteFormat::EdNote,
        NoteFormat::Narrative,
        NoteFormat::Structured,
        NoteFormat::Differential,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoteFormat::Soap => "soap",
            NoteFormat::EdNote => "ed-note",
            NoteFormat::Narrative => "narrative",
            NoteFormat::Structured => "structured",
            NoteFormat::Differential => "differential",
        }
    }
}

impl fmt::Display for NoteFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteFormat {
    type Err = MedscribeError;

    /// Accepts the kebab-case names plus a few common spellings
    /// (`ed`, `ed_note`, `SOAP`). Matching is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "soap" => Ok(NoteFormat::Soap),
            "ed-note" | "ed" => Ok(NoteFormat::EdNote),
            "narrative" => Ok(NoteFormat::Narrative),
            "structured" => Ok(NoteFormat::Structured),
            "differential" => Ok(NoteFormat::Differential),
            _ => Err(MedscribeError::UnknownNoteFormat {
                format: s.to_string(),
            }),
        }
    }
}
