//! The analyzer: the deterministic transcript-to-note pipeline.
//!
//! The analyzer enforces the pipeline order:
//!
//!   Transcript → Extract → Medications/Allergies → Red flags → Diagnostics
//!
//! and renders notes from the resulting `Analysis`. It holds no state between
//! calls, so one analyzer can serve any number of transcripts concurrently.

use tracing::{debug, info, warn};

use medscribe_contracts::{
    alert::sort_red_flags,
    analysis::Analysis,
    diagnostic::Diagnostic,
    encounter::ClinicalEncounter,
    note::NoteFormat,
    vitals::VitalKind,
};

use crate::traits::{EncounterExtractor, MedicationParser, NoteRenderer, RedFlagDetector};

/// Wires the four pipeline components together.
pub struct Analyzer {
    extractor: Box<dyn EncounterExtractor>,
    medications: Box<dyn MedicationParser>,
    detector: Box<dyn RedFlagDetector>,
    renderer: Box<dyn NoteRenderer>,
}

impl Analyzer {
    pub fn new(
        extractor: Box<dyn EncounterExtractor>,
        medications: Box<dyn MedicationParser>,
        detector: Box<dyn RedFlagDetector>,
        renderer: Box<dyn NoteRenderer>,
    ) -> Self {
        Self { extractor, medications, detector, renderer }
    }

    /// Analyze one transcript.
    ///
    /// # Pipeline
    ///
    /// 1. `extractor.extract()` builds the encounter
    /// 2. `medications` fills the medication and allergy lists
    /// 3. `detector.detect()` evaluates the rule bank against the completed
    ///    encounter and the raw transcript
    /// 4. Alerts are sorted into canonical order
    /// 5. Degraded results are collected as diagnostics
    ///
    /// Never fails. Identical input always yields an identical `Analysis`.
    pub fn analyze(&self, transcript: &str) -> Analysis {
        // Only the length is logged; transcript text is PHI.
        debug!(chars = transcript.len(), "analysis starting");

        let extracted = self.extractor.extract(transcript);
        let encounter = ClinicalEncounter {
            medications: self.medications.extract_medications(transcript),
            allergies: self.medications.extract_allergies(transcript),
            ..extracted
        };

        let mut red_flags = self.detector.detect(&encounter, transcript);
        sort_red_flags(&mut red_flags);

        let diagnostics = diagnose(&encounter);

        info!(
            clear_complaint = encounter.has_clear_complaint(),
            associated = encounter.associated_symptoms.len(),
            negatives = encounter.pertinent_negatives.len(),
            medications = encounter.medications.len(),
            allergies = encounter.allergies.len(),
            red_flags = red_flags.len(),
            diagnostics = diagnostics.len(),
            "analysis complete"
        );

        Analysis { encounter, red_flags, diagnostics }
    }

    /// Render a note for a completed analysis.
    pub fn render(&self, analysis: &Analysis, format: NoteFormat) -> String {
        debug!(format = %format, "rendering note");
        let encounter = &analysis.encounter;
        self.renderer.render(
            encounter,
            &encounter.medications,
            &encounter.allergies,
            &analysis.red_flags,
            format,
        )
    }
}

/// Collect the non-fatal diagnostics for an encounter.
///
/// Order: missing fields, out-of-range vitals, ambiguous polarity.
pub fn diagnose(encounter: &ClinicalEncounter) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let missing = |field: &str| Diagnostic::MissingField { field: field.to_string() };
    if !encounter.has_clear_complaint() {
        diagnostics.push(missing("chief_complaint"));
    }
    if encounter.timeline.onset.is_none() {
        diagnostics.push(missing("timeline.onset"));
    }
    if encounter.vitals.is_none() {
        diagnostics.push(missing("vitals"));
    }
    if encounter.allergies.is_empty() && !encounter.no_known_allergies {
        diagnostics.push(missing("allergies"));
    }

    if let Some(vitals) = &encounter.vitals {
        for kind in [
            VitalKind::Systolic,
            VitalKind::Diastolic,
            VitalKind::HeartRate,
            VitalKind::Temperature,
            VitalKind::RespiratoryRate,
            VitalKind::OxygenSaturation,
        ] {
            let Some(reading) = vitals.reading(kind) else {
                continue;
            };
            let (low, high) = kind.bounds();
            // Blood pressure carries one flag for both components; report
            // only the component that is actually out of range.
            if reading.needs_verification && (reading.value < low || reading.value > high) {
                warn!(vital = %kind, "vital outside plausible bounds");
                diagnostics.push(Diagnostic::OutOfRangeValue {
                    vital: kind,
                    value: reading.value,
                });
            }
        }
    }

    for term in &encounter.conflicting_mentions {
        diagnostics.push(Diagnostic::AmbiguousPolarity { term: term.clone() });
    }

    diagnostics
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use medscribe_contracts::{
        alert::{is_ranked, AlertSeverity, RedFlag, RedFlagCategory},
        diagnostic::Diagnostic,
        encounter::ClinicalEncounter,
        medication::{Allergy, Medication},
        note::NoteFormat,
        vitals::{BloodPressure, VitalKind, VitalReading, Vitals},
    };

    use crate::traits::{EncounterExtractor, MedicationParser, NoteRenderer, RedFlagDetector};

    use super::{diagnose, Analyzer};

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// An extractor returning a fixed encounter.
    struct MockExtractor {
        encounter: ClinicalEncounter,
    }

    impl EncounterExtractor for MockExtractor {
        fn extract(&self, _transcript: &str) -> ClinicalEncounter {
            self.encounter.clone()
        }
    }

    /// A parser returning one medication and no allergies.
    struct MockParser;

    impl MedicationParser for MockParser {
        fn extract_medications(&self, _transcript: &str) -> Vec<Medication> {
            vec![Medication::named("Aspirin")]
        }

        fn extract_allergies(&self, _transcript: &str) -> Vec<Allergy> {
            vec![]
        }
    }

    /// A detector that records the encounter it was given and returns its
    /// alerts deliberately out of order.
    struct MockDetector {
        seen: Arc<Mutex<Vec<ClinicalEncounter>>>,
    }

    impl RedFlagDetector for MockDetector {
        fn detect(&self, encounter: &ClinicalEncounter, _transcript: &str) -> Vec<RedFlag> {
            self.seen.lock().unwrap().push(encounter.clone());
            vec![
                flag(RedFlagCategory::Sepsis, AlertSeverity::Urgent, 0.9),
                flag(RedFlagCategory::Stemi, AlertSeverity::Critical, 0.5),
            ]
        }
    }

    /// A renderer that echoes what it was asked to render.
    struct MockRenderer;

    impl NoteRenderer for MockRenderer {
        fn render(
            &self,
            encounter: &ClinicalEncounter,
            medications: &[Medication],
            _allergies: &[Allergy],
            red_flags: &[RedFlag],
            format: NoteFormat,
        ) -> String {
            format!(
                "{format}|{}|{}|{}",
                encounter.chief_complaint,
                medications.len(),
                red_flags.len()
            )
        }
    }

    fn flag(category: RedFlagCategory, severity: AlertSeverity, confidence: f64) -> RedFlag {
        RedFlag {
            category,
            severity,
            confidence,
            matched_findings: vec![],
            recommendation: String::new(),
        }
    }

    fn chest_pain() -> ClinicalEncounter {
        ClinicalEncounter {
            chief_complaint: "chest pain".to_string(),
            ..ClinicalEncounter::unclear()
        }
    }

    fn analyzer(encounter: ClinicalEncounter) -> (Analyzer, Arc<Mutex<Vec<ClinicalEncounter>>>) {
        let seen = Arc::new(Mutex::new(vec![]));
        let analyzer = Analyzer::new(
            Box::new(MockExtractor { encounter }),
            Box::new(MockParser),
            Box::new(MockDetector { seen: seen.clone() }),
            Box::new(MockRenderer),
        );
        (analyzer, seen)
    }

    // ── Pipeline ─────────────────────────────────────────────────────────────

    /// The detector must see the encounter after medications were attached.
    #[test]
    fn test_detector_sees_completed_encounter() {
        let (analyzer, seen) = analyzer(chest_pain());
        analyzer.analyze("irrelevant");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].medications, vec![Medication::named("Aspirin")]);
    }

    #[test]
    fn test_alerts_are_ranked_even_if_detector_is_not() {
        let (analyzer, _) = analyzer(chest_pain());
        let analysis = analyzer.analyze("irrelevant");

        assert!(is_ranked(&analysis.red_flags));
        assert_eq!(analysis.red_flags[0].category, RedFlagCategory::Stemi);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let (analyzer, _) = analyzer(chest_pain());
        assert_eq!(analyzer.analyze("same text"), analyzer.analyze("same text"));
    }

    #[test]
    fn test_render_passes_analysis_through() {
        let (analyzer, _) = analyzer(chest_pain());
        let analysis = analyzer.analyze("irrelevant");
        let note = analyzer.render(&analysis, NoteFormat::EdNote);
        assert_eq!(note, "ed-note|chest pain|1|2");
    }

    // ── Diagnostics ──────────────────────────────────────────────────────────

    #[test]
    fn test_unclear_encounter_reports_missing_fields() {
        let diagnostics = diagnose(&ClinicalEncounter::unclear());
        let fields: Vec<String> = diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::MissingField { field } => Some(field.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            fields,
            vec!["chief_complaint", "timeline.onset", "vitals", "allergies"]
        );
    }

    #[test]
    fn test_no_known_allergies_is_not_missing() {
        let encounter = ClinicalEncounter {
            no_known_allergies: true,
            ..chest_pain()
        };
        let diagnostics = diagnose(&encounter);
        assert!(!diagnostics.contains(&Diagnostic::MissingField {
            field: "allergies".to_string()
        }));
    }

    #[test]
    fn test_out_of_range_vitals_reported_per_component() {
        let encounter = ClinicalEncounter {
            vitals: Some(Vitals {
                blood_pressure: Some(BloodPressure {
                    systolic: 300.0,
                    diastolic: 80.0,
                    needs_verification: true,
                }),
                heart_rate: Some(VitalReading { value: 220.0, needs_verification: true }),
                oxygen_saturation: Some(VitalReading { value: 98.0, needs_verification: false }),
                ..Vitals::default()
            }),
            ..chest_pain()
        };

        let out_of_range: Vec<(VitalKind, f64)> = diagnose(&encounter)
            .into_iter()
            .filter_map(|d| match d {
                Diagnostic::OutOfRangeValue { vital, value } => Some((vital, value)),
                _ => None,
            })
            .collect();
        assert_eq!(
            out_of_range,
            vec![(VitalKind::Systolic, 300.0), (VitalKind::HeartRate, 220.0)]
        );
    }

    #[test]
    fn test_conflicting_mentions_reported() {
        let mut encounter = chest_pain();
        encounter.conflicting_mentions.insert("nausea".to_string());
        let diagnostics = diagnose(&encounter);
        assert!(diagnostics.contains(&Diagnostic::AmbiguousPolarity {
            term: "nausea".to_string()
        }));
    }
}
