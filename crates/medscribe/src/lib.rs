//! # medscribe
//!
//! Deterministic clinical transcript analysis.
//!
//! [`Scribe`] wires the default pipeline: the lexicon-driven entity and
//! medication extractors, the TOML red-flag rule bank, and the note
//! assembler. Configuration is loaded once and shared read-only; after that
//! `analyze` and `render` never fail.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use medscribe::{Scribe, NoteFormat};
//!
//! let scribe = Scribe::builtin()?;
//! let analysis = scribe.analyze("crushing chest pain radiating to left arm, diaphoretic");
//! for flag in &analysis.red_flags {
//!     println!("[{}] {}", flag.severity, flag.category);
//! }
//! println!("{}", scribe.render(&analysis, NoteFormat::Soap));
//! ```

pub mod config;
pub mod samples;

use std::sync::Arc;

use tracing::info;

use medscribe_core::Analyzer;
use medscribe_extract::{EntityExtractor, MedicationExtractor};
use medscribe_lexicon::Lexicon;
use medscribe_note::NoteAssembler;
use medscribe_rules::TomlRedFlagDetector;

pub use config::ScribeConfig;
pub use medscribe_contracts::{
    alert::{AlertSeverity, RedFlag, RedFlagCategory},
    analysis::Analysis,
    diagnostic::Diagnostic,
    encounter::ClinicalEncounter,
    error::{MedscribeError, MedscribeResult},
    medication::{Allergy, Medication},
    note::NoteFormat,
};
pub use samples::{sample, Sample, SAMPLES};

/// The assembled pipeline.
pub struct Scribe {
    analyzer: Analyzer,
    default_format: NoteFormat,
}

impl Scribe {
    /// The pipeline with the built-in lexicon and rule bank.
    pub fn builtin() -> MedscribeResult<Self> {
        Self::from_config(&ScribeConfig::default())
    }

    /// Build the pipeline, loading any configured lexicon or rule bank file
    /// in place of the built-in one.
    ///
    /// Fails with `ConfigError` if a file is unreadable or malformed, and
    /// with `InvalidRuleSet` if a rule-set is invalid or names vocabulary the
    /// lexicon does not define.
    pub fn from_config(config: &ScribeConfig) -> MedscribeResult<Self> {
        let lexicon = match &config.lexicon {
            Some(path) => Lexicon::from_file(path)?,
            None => Lexicon::builtin()?,
        };
        let detector = match &config.rules {
            Some(path) => TomlRedFlagDetector::from_file(path, &lexicon.negation)?,
            None => TomlRedFlagDetector::builtin(&lexicon.negation)?,
        };
        detector.check_vocabulary(&lexicon)?;

        info!(
            custom_lexicon = config.lexicon.is_some(),
            custom_rules = config.rules.is_some(),
            rule_sets = detector.rule_set_count(),
            "pipeline ready"
        );

        let lexicon = Arc::new(lexicon);
        let analyzer = Analyzer::new(
            Box::new(EntityExtractor::new(Arc::clone(&lexicon))),
            Box::new(MedicationExtractor::new(lexicon)),
            Box::new(detector),
            Box::new(NoteAssembler::new()),
        );
        Ok(Self {
            analyzer,
            default_format: config.format(),
        })
    }

    pub fn analyze(&self, transcript: &str) -> Analysis {
        self.analyzer.analyze(transcript)
    }

    pub fn render(&self, analysis: &Analysis, format: NoteFormat) -> String {
        self.analyzer.render(analysis, format)
    }

    /// The configured default note format (SOAP unless configured).
    pub fn default_format(&self) -> NoteFormat {
        self.default_format
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    use medscribe_contracts::alert::is_ranked;
    use medscribe_contracts::encounter::UNCLEAR_CHIEF_COMPLAINT;
    use medscribe_contracts::medication::{DoseUnit, Frequency, Origin, Route};
    use medscribe_contracts::note::NOT_DISCUSSED;
    use medscribe_contracts::vitals::VitalKind;

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn scribe() -> Scribe {
        Scribe::builtin().unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("medscribe-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const SCENARIO_E: &str = "The weather has been lovely and the parking lot was full today.";

    // ── 1. scenarios ──────────────────────────────────────────────────────────

    #[test]
    fn test_denied_symptoms_become_pertinent_negatives() {
        let analysis = scribe().analyze("Patient denies chest pain, shortness of breath, and nausea.");
        let e = &analysis.encounter;
        assert_eq!(
            e.pertinent_negatives,
            set(&["chest pain", "nausea", "shortness of breath"])
        );
        assert!(e.associated_symptoms.is_empty());
    }

    #[test]
    fn test_classic_stemi_presentation() {
        let analysis =
            scribe().analyze("crushing chest pain radiating to left arm, diaphoretic, hypertensive");
        let top = &analysis.red_flags[0];
        assert_eq!(top.category, RedFlagCategory::Stemi);
        assert_eq!(top.severity, AlertSeverity::Critical);
        assert!(top.confidence > 0.5, "confidence {}", top.confidence);
    }

    #[test]
    fn test_implausible_vitals_flagged_and_kept() {
        let analysis = scribe().analyze("BP 300 over 180, heart rate 220");
        let vitals = analysis.encounter.vitals.unwrap();
        let bp = vitals.blood_pressure.unwrap();
        assert!(bp.needs_verification);
        assert_eq!((bp.systolic, bp.diastolic), (300.0, 180.0));
        let hr = vitals.heart_rate.unwrap();
        assert!(hr.needs_verification);
        assert_eq!(hr.value, 220.0);

        let out_of_range: Vec<VitalKind> = analysis
            .diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::OutOfRangeValue { vital, .. } => Some(*vital),
                _ => None,
            })
            .collect();
        assert_eq!(
            out_of_range,
            vec![VitalKind::Systolic, VitalKind::Diastolic, VitalKind::HeartRate]
        );
    }

    #[test]
    fn test_plausible_blood_pressure_not_flagged() {
        let analysis = scribe().analyze("BP 120/80");
        let bp = analysis.encounter.vitals.unwrap().blood_pressure.unwrap();
        assert!(!bp.needs_verification);
    }

    #[test]
    fn test_full_medication_record() {
        let analysis =
            scribe().analyze("Lisinopril 10 milligrams by mouth once daily for high blood pressure");
        assert_eq!(
            analysis.encounter.medications,
            vec![Medication {
                name: "Lisinopril".to_string(),
                dose: Some("10".to_string()),
                unit: Some(DoseUnit::Mg),
                route: Some(Route::Po),
                frequency: Some(Frequency::Daily),
                indication: Some("high blood pressure".to_string()),
                origin: Origin::Unspecified,
            }]
        );
    }

    #[test]
    fn test_unrecognizable_transcript_renders_placeholders() {
        let scribe = scribe();
        let analysis = scribe.analyze(SCENARIO_E);
        assert_eq!(analysis.encounter.chief_complaint, UNCLEAR_CHIEF_COMPLAINT);
        assert!(analysis.red_flags.is_empty());

        let note = scribe.render(&analysis, NoteFormat::Soap);
        let headings = ["SUBJECTIVE", "OBJECTIVE", "ASSESSMENT", "PLAN"];
        for line in note.lines().filter(|l| !l.is_empty() && !headings.contains(l)) {
            assert!(
                line.ends_with(NOT_DISCUSSED) || line.ends_with(UNCLEAR_CHIEF_COMPLAINT),
                "unexpected content: {line}"
            );
        }
    }

    // ── 2. pipeline properties ────────────────────────────────────────────────

    #[test]
    fn test_analysis_is_idempotent() {
        let scribe = scribe();
        for s in SAMPLES {
            assert_eq!(scribe.analyze(s.transcript), scribe.analyze(s.transcript), "{}", s.name);
        }
    }

    #[test]
    fn test_symptom_lists_disjoint_and_flags_ranked() {
        let scribe = scribe();
        for s in SAMPLES {
            let analysis = scribe.analyze(s.transcript);
            let e = &analysis.encounter;
            assert!(
                e.associated_symptoms.is_disjoint(&e.pertinent_negatives),
                "{}",
                s.name
            );
            assert!(is_ranked(&analysis.red_flags), "{}", s.name);
            assert!(analysis
                .red_flags
                .iter()
                .all(|f| (0.0..=1.0).contains(&f.confidence)));
        }
    }

    #[test]
    fn test_samples_produce_expected_alerts() {
        let scribe = scribe();
        let top = |name: &str| {
            let s = sample(name).unwrap();
            scribe.analyze(s.transcript).red_flags.first().map(|f| f.category)
        };
        assert_eq!(top("chest-pain"), Some(RedFlagCategory::Stemi));
        assert_eq!(top("stroke"), Some(RedFlagCategory::Stroke));
        assert_eq!(top("small-talk"), None);
    }

    #[test]
    fn test_rendered_note_leads_with_alerts() {
        let scribe = scribe();
        let analysis = scribe.analyze(sample("chest-pain").unwrap().transcript);
        for format in NoteFormat::ALL {
            let note = scribe.render(&analysis, format);
            assert!(note.starts_with("*** RED FLAGS ***"), "{format}");
            assert!(note.contains("STEMI"), "{format}");
        }
    }

    #[test]
    fn test_analysis_serializes_with_stable_tags() {
        let analysis = scribe().analyze(sample("chest-pain").unwrap().transcript);
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["red_flags"][0]["category"], "stemi");
        assert_eq!(json["red_flags"][0]["severity"], "critical");
    }

    // ── 3. configuration ──────────────────────────────────────────────────────

    #[test]
    fn test_default_format_from_config() {
        assert_eq!(scribe().default_format(), NoteFormat::Soap);
        let config = ScribeConfig {
            default_format: Some(NoteFormat::Differential),
            ..ScribeConfig::default()
        };
        assert_eq!(
            Scribe::from_config(&config).unwrap().default_format(),
            NoteFormat::Differential
        );
    }

    #[test]
    fn test_custom_rule_bank_replaces_builtin() {
        let dir = temp_dir("rules");
        let path = dir.join("red_flags.toml");
        std::fs::write(
            &path,
            r#"
            [[rule_sets]]
            category = "gi_bleed"
            severity = "urgent"
            recommendation = "Type and cross."

            [[rule_sets.findings]]
            label = "melena"
            weight = 1.0
            when = { kind = "text", terms = ["black stool", "black stools"] }

            [[rule_sets.findings]]
            label = "anticoagulated"
            weight = 1.0
            when = { kind = "medication", names = ["Warfarin"] }
            "#,
        )
        .unwrap();

        let config = ScribeConfig { rules: Some(path), ..ScribeConfig::default() };
        let scribe = Scribe::from_config(&config).unwrap();
        let analysis = scribe.analyze("I have had black stools since yesterday. I take warfarin 5 mg daily.");
        assert_eq!(analysis.red_flags.len(), 1);
        assert_eq!(analysis.red_flags[0].category, RedFlagCategory::GiBleed);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rule_bank_with_unknown_vocabulary_rejected() {
        let dir = temp_dir("bad-rules");
        let path = dir.join("red_flags.toml");
        std::fs::write(
            &path,
            r#"
            [[rule_sets]]
            category = "sepsis"
            severity = "critical"
            recommendation = "Cultures."

            [[rule_sets.findings]]
            label = "air hunger"
            weight = 1.0
            when = { kind = "symptom", names = ["air hunger"] }
            "#,
        )
        .unwrap();

        let config = ScribeConfig { rules: Some(path), ..ScribeConfig::default() };
        let result = Scribe::from_config(&config);
        assert!(matches!(result, Err(MedscribeError::InvalidRuleSet { .. })));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_lexicon_file_is_config_error() {
        let config = ScribeConfig {
            lexicon: Some(PathBuf::from("/nonexistent/clinical.toml")),
            ..ScribeConfig::default()
        };
        assert!(matches!(
            Scribe::from_config(&config),
            Err(MedscribeError::ConfigError { .. })
        ));
    }
}
