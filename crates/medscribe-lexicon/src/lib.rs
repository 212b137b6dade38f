//! # medscribe-lexicon
//!
//! The curated vocabulary consulted by every stage of the medscribe
//! pipeline: negation cues, complaint profiles, symptoms, qualifiers,
//! onset/progression keywords, history conditions, drugs and dosing grammar,
//! and allergy vocabulary.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medscribe_lexicon::Lexicon;
//!
//! let lexicon = Arc::new(Lexicon::builtin()?);
//! // Share `lexicon` with every extractor; it is never mutated after load.
//! ```
//!
//! A lexicon is plain data. Matching lives in `medscribe-extract`.

pub mod loader;
pub mod vocabulary;

pub use loader::BUILTIN_LEXICON;
pub use vocabulary::{
    AllergyLexicon, CharacteristicLexicon, ComplaintLexicon, ComplaintProfile, Lexicon,
    MedicationLexicon, NegationLexicon, SeverityBuckets, Synonyms, TermEntry, TimelineLexicon,
};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use medscribe_contracts::error::MedscribeError;
    use medscribe_contracts::medication::{AllergySeverity, DoseUnit, Frequency, Route};

    use crate::Lexicon;

    /// Smallest document that passes validation. Tests splice extra lines in
    /// to exercise individual checks.
    fn minimal(extra_negation: &str, profile_symptom: &str) -> String {
        format!(
            r#"
            [negation]
            cues = ["Denies", " no "]
            {extra_negation}

            [complaints]
            triggers = ["having"]
            clause_stop_words = ["for"]
            general_review = ["Nausea"]

            [[complaints.profiles]]
            name = "Chest Pain"
            aliases = ["chest pressure"]
            pain = true
            expected_symptoms = ["{profile_symptom}"]

            [[symptoms]]
            name = "nausea"
            aliases = ["Nauseous"]

            [characteristics]
            qualities = ["sharp"]
            locations = ["chest"]

            [characteristics.severity]
            severe = ["severe"]
            moderate = ["moderate"]
            mild = ["mild"]

            [timeline]
            onset_triggers = ["started"]
            time_keywords = ["ago"]
            worsening = ["worse"]
            improving = ["better"]
            stable = ["stable"]

            [[conditions]]
            name = "Hypertension"
            aliases = ["High Blood Pressure"]

            [medications]
            home_cues = ["at home"]
            administered_cues = ["gave"]
            indication_cues = ["for"]

            [[medications.drugs]]
            name = "Lisinopril"
            aliases = ["Zestril"]

            [[medications.units]]
            value = "mg"
            aliases = ["Milligrams"]

            [[medications.routes]]
            value = "PO"
            aliases = ["by mouth"]

            [[medications.frequencies]]
            value = "BID"
            aliases = ["twice a day"]

            [allergies]
            triggers = ["allergic to"]
            context_words = ["allergic"]
            no_known = ["nkda"]
            allergens = ["penicillin"]
            reactions = ["hives"]

            [[allergies.severity]]
            value = "moderate"
            aliases = ["hives"]
            "#
        )
    }

    fn config_reason(result: Result<Lexicon, MedscribeError>) -> String {
        match result {
            Err(MedscribeError::ConfigError { reason }) => reason,
            other => panic!("expected ConfigError, got {:?}", other.map(|_| ())),
        }
    }

    // ── Built-in lexicon ─────────────────────────────────────────────────────

    #[test]
    fn test_builtin_lexicon_loads() {
        let lexicon = Lexicon::builtin().expect("built-in lexicon must load");
        assert_eq!(lexicon.negation.window, 5);
        assert!(lexicon.negation.cues.len() >= 20, "need at least 20 cues");
        assert!(lexicon.negation.cues.iter().any(|c| c == "negative for"));
        assert!(lexicon.negation.cues.iter().any(|c| c == "ruled out"));
    }

    #[test]
    fn test_builtin_brand_names_are_aliases_of_generics() {
        let lexicon = Lexicon::builtin().unwrap();
        let find = |alias: &str| {
            lexicon
                .medications
                .drugs
                .iter()
                .find(|d| d.aliases.iter().any(|a| a == alias))
                .map(|d| d.name.as_str())
        };
        assert_eq!(find("tylenol"), Some("Acetaminophen"));
        assert_eq!(find("motrin"), Some("Ibuprofen"));
        assert_eq!(find("lantus"), Some("Insulin glargine"));
        assert_eq!(find("lisinopril"), Some("Lisinopril"));
    }

    #[test]
    fn test_builtin_longform_dosing_synonyms() {
        let lexicon = Lexicon::builtin().unwrap();
        let meds = &lexicon.medications;
        let unit = meds
            .units
            .iter()
            .find(|u| u.aliases.iter().any(|a| a == "milligrams"))
            .map(|u| u.value);
        let route = meds
            .routes
            .iter()
            .find(|r| r.aliases.iter().any(|a| a == "by mouth"))
            .map(|r| r.value);
        let frequency = meds
            .frequencies
            .iter()
            .find(|f| f.aliases.iter().any(|a| a == "twice a day"))
            .map(|f| f.value);
        assert_eq!(unit, Some(DoseUnit::Mg));
        assert_eq!(route, Some(Route::Po));
        assert_eq!(frequency, Some(Frequency::Bid));
    }

    #[test]
    fn test_builtin_allergy_tiers_checked_most_severe_first() {
        let lexicon = Lexicon::builtin().unwrap();
        let tiers: Vec<AllergySeverity> =
            lexicon.allergies.severity.iter().map(|s| s.value).collect();
        assert_eq!(
            tiers,
            vec![
                AllergySeverity::Anaphylaxis,
                AllergySeverity::Severe,
                AllergySeverity::Moderate,
                AllergySeverity::Mild,
            ]
        );
    }

    #[test]
    fn test_builtin_profile_lookup() {
        let lexicon = Lexicon::builtin().unwrap();
        let profile = lexicon.profile_for("crushing chest pain").unwrap();
        assert_eq!(profile.name, "chest pain");
        assert!(profile.pain);
        assert!(profile
            .expected_symptoms
            .iter()
            .any(|s| s == "diaphoresis"));

        assert_eq!(lexicon.profile_for("sob").unwrap().name, "shortness of breath");
        assert!(lexicon.profile_for("the weather").is_none());
    }

    // ── Normalization ────────────────────────────────────────────────────────

    #[test]
    fn test_phrases_are_trimmed_and_lowercased() {
        let lexicon = Lexicon::from_toml_str(&minimal("", "nausea")).unwrap();
        assert_eq!(lexicon.negation.cues, vec!["denies", "no"]);
        assert_eq!(lexicon.medications.units[0].aliases, vec!["milligrams"]);
    }

    #[test]
    fn test_canonical_name_becomes_first_alias() {
        let lexicon = Lexicon::from_toml_str(&minimal("", "nausea")).unwrap();

        let drug = &lexicon.medications.drugs[0];
        assert_eq!(drug.name, "Lisinopril", "display name keeps its case");
        assert_eq!(drug.aliases, vec!["lisinopril", "zestril"]);

        let symptom = lexicon.symptom("nausea").unwrap();
        assert_eq!(symptom.aliases, vec!["nausea", "nauseous"]);

        let condition = &lexicon.conditions[0];
        assert_eq!(condition.name, "hypertension");
        assert_eq!(condition.aliases, vec!["hypertension", "high blood pressure"]);

        let profile = &lexicon.complaints.profiles[0];
        assert_eq!(profile.name, "chest pain");
        assert_eq!(profile.aliases, vec!["chest pain", "chest pressure"]);
    }

    #[test]
    fn test_defaults_apply_when_omitted() {
        let lexicon = Lexicon::from_toml_str(&minimal("", "nausea")).unwrap();
        assert_eq!(lexicon.negation.window, 5);
        assert_eq!(lexicon.negation.trailing_window, 3);
        assert_eq!(lexicon.complaints.max_clause_chars, 30);
        assert_eq!(lexicon.timeline.onset_window, 8);
        assert_eq!(lexicon.medications.indication_max_words, 5);
    }

    // ── Validation ───────────────────────────────────────────────────────────

    #[test]
    fn test_zero_window_rejected() {
        let reason = config_reason(Lexicon::from_toml_str(&minimal("window = 0", "nausea")));
        assert!(reason.contains("window"), "got: {reason}");
    }

    #[test]
    fn test_unknown_profile_symptom_rejected() {
        let reason = config_reason(Lexicon::from_toml_str(&minimal("", "levitation")));
        assert!(reason.contains("levitation"), "got: {reason}");
    }

    #[test]
    fn test_conditions_table_is_optional() {
        let without: String = minimal("", "nausea")
            .lines()
            .filter(|line| {
                !["[[conditions]]", "Hypertension", "High Blood Pressure"]
                    .iter()
                    .any(|key| line.contains(key))
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(!without.contains("[[conditions]]"));
        let lexicon = Lexicon::from_toml_str(&without).unwrap();
        assert!(lexicon.conditions.is_empty());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let reason = config_reason(Lexicon::from_toml_str("[negation\ncues = "));
        assert!(reason.contains("failed to parse"), "got: {reason}");
    }

    #[test]
    fn test_missing_file_rejected() {
        let reason = config_reason(Lexicon::from_file(std::path::Path::new(
            "/nonexistent/medscribe/lexicon.toml",
        )));
        assert!(reason.contains("failed to read"), "got: {reason}");
    }
}
