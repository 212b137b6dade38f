//! Note assembly.
//!
//! `NoteAssembler` is the default `NoteRenderer`. Every format is a fixed
//! sequence of sections built from [`crate::sections`]; the red-flag block,
//! when any alert fired, always comes first.
//!
//! Section order per format:
//!
//! | Format | Sections |
//! |---|---|
//! | SOAP | SUBJECTIVE, OBJECTIVE, ASSESSMENT, PLAN |
//! | ED note | CHIEF COMPLAINT, HPI, REVIEW OF SYSTEMS, PMH, MEDICATIONS, ALLERGIES, VITAL SIGNS, MEDICAL DECISION MAKING, PLAN/DISPOSITION |
//! | Narrative | one paragraph per topic, same order as the ED note |
//! | Structured | one `key: value` line per encounter field |
//! | Differential | CHIEF COMPLAINT, KEY FINDINGS, PERTINENT NEGATIVES, DIFFERENTIAL CONSIDERATIONS, RECOMMENDED WORKUP |

use tracing::debug;

use medscribe_contracts::{
    alert::RedFlag,
    encounter::ClinicalEncounter,
    medication::{Allergy, Medication},
    note::{NoteFormat, NOT_DISCUSSED},
};
use medscribe_core::traits::NoteRenderer;

use crate::sections;

/// The built-in note renderer. Stateless.
pub struct NoteAssembler;

impl NoteAssembler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoteAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteRenderer for NoteAssembler {
    fn render(
        &self,
        encounter: &ClinicalEncounter,
        medications: &[Medication],
        allergies: &[Allergy],
        red_flags: &[RedFlag],
        format: NoteFormat,
    ) -> String {
        render_note(&NoteInput { encounter, medications, allergies, red_flags }, format)
    }
}

/// Borrowed inputs of one render call.
#[derive(Debug, Clone, Copy)]
pub struct NoteInput<'a> {
    pub encounter: &'a ClinicalEncounter,
    pub medications: &'a [Medication],
    pub allergies: &'a [Allergy],
    pub red_flags: &'a [RedFlag],
}

/// Render `input` in `format`. Pure: equal inputs give byte-identical notes.
pub fn render_note(input: &NoteInput<'_>, format: NoteFormat) -> String {
    debug!(format = %format, red_flags = input.red_flags.len(), "assembling note");

    let mut note = NoteWriter::default();
    let block = sections::red_flag_block(input.red_flags);
    if !block.is_empty() {
        note.lines(&block);
    }

    match format {
        NoteFormat::Soap => soap(&mut note, input),
        NoteFormat::EdNote => ed_note(&mut note, input),
        NoteFormat::Narrative => narrative(&mut note, input),
        NoteFormat::Structured => structured(&mut note, input),
        NoteFormat::Differential => differential(&mut note, input),
    }
    note.finish()
}

// ── Formats ──────────────────────────────────────────────────────────────────

fn soap(note: &mut NoteWriter, input: &NoteInput<'_>) {
    let e = input.encounter;

    note.heading("SUBJECTIVE");
    note.labelled("Chief complaint", &sections::chief_complaint(e));
    note.labelled_block("History of present illness", &sections::history_of_present_illness(e));
    note.labelled("Associated symptoms", &sections::associated_symptoms(e));
    note.labelled("Pertinent negatives", &sections::pertinent_negatives(e));
    note.labelled("Past medical history", &sections::medical_history(e));
    note.labelled_block("Medications", &sections::medications(input.medications));
    note.labelled_block("Allergies", &sections::allergies(e, input.allergies));

    note.heading("OBJECTIVE");
    note.labelled_block("Vital signs", &sections::vitals(e.vitals.as_ref()));

    note.heading("ASSESSMENT");
    note.lines(&sections::assessment(input.red_flags));

    note.heading("PLAN");
    note.lines(&sections::plan(input.red_flags));
}

fn ed_note(note: &mut NoteWriter, input: &NoteInput<'_>) {
    let e = input.encounter;

    note.heading("CHIEF COMPLAINT");
    note.line(&sections::chief_complaint(e));

    note.heading("HISTORY OF PRESENT ILLNESS");
    note.lines(&sections::history_of_present_illness(e));

    note.heading("REVIEW OF SYSTEMS");
    note.labelled("Positive", &sections::associated_symptoms(e));
    note.labelled("Negative", &sections::pertinent_negatives(e));

    note.heading("PAST MEDICAL HISTORY");
    note.line(&sections::medical_history(e));

    note.heading("MEDICATIONS");
    note.lines(&sections::medications(input.medications));

    note.heading("ALLERGIES");
    note.lines(&sections::allergies(e, input.allergies));

    note.heading("VITAL SIGNS");
    note.lines(&sections::vitals(e.vitals.as_ref()));

    note.heading("MEDICAL DECISION MAKING");
    note.lines(&sections::assessment(input.red_flags));

    note.heading("PLAN/DISPOSITION");
    note.lines(&sections::plan(input.red_flags));
}

fn narrative(note: &mut NoteWriter, input: &NoteInput<'_>) {
    let e = input.encounter;

    note.heading("CLINICAL NARRATIVE");
    note.line(&sentence("Chief complaint", &sections::chief_complaint(e)));
    note.line(&sentence(
        "History of present illness",
        &sections::history_of_present_illness(e).join("; "),
    ));
    note.line(&sentence("Associated symptoms", &sections::associated_symptoms(e)));
    note.line(&sentence("Pertinent negatives", &sections::pertinent_negatives(e)));
    note.line(&sentence("Past medical history", &sections::medical_history(e)));
    note.line(&sentence(
        "Medications",
        &sections::medications(input.medications).join("; "),
    ));
    note.line(&sentence(
        "Allergies",
        &sections::allergies(e, input.allergies).join("; "),
    ));
    note.line(&sentence(
        "Vital signs",
        &sections::vitals(e.vitals.as_ref()).join(", "),
    ));
    note.line(&sentence("Assessment", &sections::assessment(input.red_flags).join("; ")));
    note.line(&sentence("Plan", &sections::plan(input.red_flags).join("; ")));
}

fn structured(note: &mut NoteWriter, input: &NoteInput<'_>) {
    let e = input.encounter;
    let field = |name: &str| {
        e.characteristic(name)
            .map(str::to_string)
            .unwrap_or_else(|| NOT_DISCUSSED.to_string())
    };

    note.heading("STRUCTURED NOTE");
    note.labelled("chief_complaint", &sections::chief_complaint(e));
    for name in ["quality", "severity", "location", "radiation", "duration"] {
        note.labelled(name, &field(name));
    }
    note.labelled(
        "onset",
        e.timeline.onset.as_deref().unwrap_or(NOT_DISCUSSED),
    );
    note.labelled(
        "progression",
        &e.timeline
            .progression
            .map(|p| p.to_string())
            .unwrap_or_else(|| NOT_DISCUSSED.to_string()),
    );
    note.labelled("associated_symptoms", &sections::associated_symptoms(e));
    note.labelled("pertinent_negatives", &sections::pertinent_negatives(e));
    note.labelled("medical_history", &sections::medical_history(e));
    note.labelled("medications", &sections::medications(input.medications).join("; "));
    note.labelled("allergies", &sections::allergies(e, input.allergies).join("; "));
    note.labelled("vitals", &sections::vitals(e.vitals.as_ref()).join(", "));
    note.labelled(
        "red_flags",
        &sections::join_or_placeholder(input.red_flags.iter().map(|f| {
            format!("{} ({}, {}%)", f.category, f.severity, f.confidence_percent())
        })),
    );
}

fn differential(note: &mut NoteWriter, input: &NoteInput<'_>) {
    let e = input.encounter;

    note.heading("CHIEF COMPLAINT");
    note.line(&sections::chief_complaint(e));

    note.heading("KEY FINDINGS");
    note.lines(&sections::history_of_present_illness(e));
    note.labelled("Associated symptoms", &sections::associated_symptoms(e));
    note.labelled_block("Vital signs", &sections::vitals(e.vitals.as_ref()));

    note.heading("PERTINENT NEGATIVES");
    note.line(&sections::pertinent_negatives(e));

    note.heading("DIFFERENTIAL CONSIDERATIONS");
    note.lines(&sections::assessment(input.red_flags));

    note.heading("RECOMMENDED WORKUP");
    note.lines(&sections::plan(input.red_flags));
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// `Label: content.` without doubling a trailing period.
fn sentence(label: &str, content: &str) -> String {
    let content = content.trim_end_matches('.');
    format!("{label}: {content}.")
}

/// Line-oriented note buffer. Sections are separated by one blank line.
#[derive(Default)]
struct NoteWriter {
    out: String,
}

impl NoteWriter {
    fn heading(&mut self, title: &str) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.line(title);
    }

    fn line(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn lines(&mut self, lines: &[String]) {
        for line in lines {
            self.line(line);
        }
    }

    fn labelled(&mut self, label: &str, value: &str) {
        self.out.push_str(label);
        self.out.push_str(": ");
        self.line(value);
    }

    /// A label followed by indented lines, or inline when there is only one.
    fn labelled_block(&mut self, label: &str, lines: &[String]) {
        match lines {
            [single] => self.labelled(label, single),
            _ => {
                self.out.push_str(label);
                self.line(":");
                for line in lines {
                    self.out.push_str("  - ");
                    self.line(line);
                }
            }
        }
    }

    fn finish(self) -> String {
        self.out
    }
}
