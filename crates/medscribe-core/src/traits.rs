//! Component trait definitions for the medscribe pipeline.
//!
//! These four traits are the component boundaries:
//!
//! - `EncounterExtractor`: complaint, qualifiers, timeline, symptoms,
//!   history and vitals
//! - `MedicationParser`:   drug and allergy records
//! - `RedFlagDetector`:    weighted rule-set evaluation
//! - `NoteRenderer`:       deterministic note text
//!
//! The analyzer wires them together in pipeline order. None of them can fail:
//! a transcript with nothing recognizable produces an empty result, not an
//! error. Implementations hold only read-only configuration and must be safe
//! to call from several threads at once.

use medscribe_contracts::{
    alert::RedFlag,
    encounter::ClinicalEncounter,
    medication::{Allergy, Medication},
    note::NoteFormat,
};

/// Builds the structured encounter from a transcript.
///
/// The returned encounter's `medications` and `allergies` are left empty;
/// the analyzer fills them from the `MedicationParser`.
pub trait EncounterExtractor: Send + Sync {
    fn extract(&self, transcript: &str) -> ClinicalEncounter;
}

/// Scans a transcript for drug and allergy mentions.
///
/// A mention with unresolved dose, route or frequency still yields a record.
pub trait MedicationParser: Send + Sync {
    fn extract_medications(&self, transcript: &str) -> Vec<Medication>;

    fn extract_allergies(&self, transcript: &str) -> Vec<Allergy>;
}

/// Evaluates the red-flag rule bank against an encounter and its transcript.
pub trait RedFlagDetector: Send + Sync {
    /// Return every rule-set that clears the firing threshold.
    ///
    /// Implementations should return alerts in canonical order, but the
    /// analyzer re-sorts them regardless.
    fn detect(&self, encounter: &ClinicalEncounter, transcript: &str) -> Vec<RedFlag>;
}

/// Renders a clinical note.
///
/// Rendering is a pure function of its inputs: the same arguments always
/// produce the same text, and nothing absent from the inputs appears in it.
pub trait NoteRenderer: Send + Sync {
    fn render(
        &self,
        encounter: &ClinicalEncounter,
        medications: &[Medication],
        allergies: &[Allergy],
        red_flags: &[RedFlag],
        format: NoteFormat,
    ) -> String;
}
