//! Loading and validating a `Lexicon` from TOML.
//!
//! Loading runs in three passes:
//!
//! 1. Parse the TOML document into the typed `Lexicon` schema.
//! 2. Normalize: trim and lowercase every phrase, and make sure each
//!    `TermEntry` and complaint profile lists its own name as an alias.
//! 3. Validate cross-references (profile symptoms must exist) and reject
//!    empty vocabularies that would silently disable a component.
//!
//! A lexicon is loaded once at start-up and then shared read-only.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, warn};

use medscribe_contracts::error::{MedscribeError, MedscribeResult};

use crate::vocabulary::{Lexicon, Synonyms, TermEntry};

/// The default clinical vocabulary shipped with the crate.
pub const BUILTIN_LEXICON: &str = include_str!("../lexicon/clinical.toml");

impl Lexicon {
    /// Parse `s` as TOML and build a normalized, validated `Lexicon`.
    ///
    /// Returns `MedscribeError::ConfigError` if the TOML is malformed, does
    /// not match the schema, or fails validation.
    pub fn from_toml_str(s: &str) -> MedscribeResult<Self> {
        let mut lexicon: Lexicon = toml::from_str(s).map_err(|e| MedscribeError::ConfigError {
            reason: format!("failed to parse lexicon TOML: {}", e),
        })?;
        lexicon.normalize();
        lexicon.validate()?;
        debug!(
            symptoms = lexicon.symptoms.len(),
            drugs = lexicon.medications.drugs.len(),
            conditions = lexicon.conditions.len(),
            "lexicon loaded"
        );
        Ok(lexicon)
    }

    /// Read the file at `path` and parse it as a lexicon.
    pub fn from_file(path: &Path) -> MedscribeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MedscribeError::ConfigError {
            reason: format!("failed to read lexicon file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The built-in clinical vocabulary.
    pub fn builtin() -> MedscribeResult<Self> {
        Self::from_toml_str(BUILTIN_LEXICON)
    }

    fn normalize(&mut self) {
        let n = &mut self.negation;
        for list in [
            &mut n.cues,
            &mut n.pseudo_cues,
            &mut n.post_cues,
            &mut n.affirmations,
            &mut n.scope_terminators,
            &mut n.list_connectors,
            &mut n.denial_answers,
            &mut n.affirm_answers,
        ] {
            lower_all(list);
        }

        let c = &mut self.complaints;
        for list in [
            &mut c.triggers,
            &mut c.clause_stop_words,
            &mut c.determiners,
            &mut c.rejected_leads,
            &mut c.general_review,
        ] {
            lower_all(list);
        }
        for profile in &mut c.profiles {
            profile.name = profile.name.trim().to_lowercase();
            lower_all(&mut profile.aliases);
            lower_all(&mut profile.expected_symptoms);
            ensure_first(&mut profile.aliases, &profile.name);
        }

        for entry in self.symptoms.iter_mut().chain(self.conditions.iter_mut()) {
            entry.name = entry.name.to_lowercase();
            normalize_entry(entry);
        }
        // Drug names keep their case for display.
        for entry in &mut self.medications.drugs {
            normalize_entry(entry);
        }

        let ch = &mut self.characteristics;
        for list in [
            &mut ch.qualities,
            &mut ch.severity.severe,
            &mut ch.severity.moderate,
            &mut ch.severity.mild,
            &mut ch.locations,
            &mut ch.radiation_cues,
        ] {
            lower_all(list);
        }

        let t = &mut self.timeline;
        for list in [
            &mut t.onset_triggers,
            &mut t.time_keywords,
            &mut t.worsening,
            &mut t.improving,
            &mut t.stable,
        ] {
            lower_all(list);
        }

        let m = &mut self.medications;
        for list in [
            &mut m.home_cues,
            &mut m.administered_cues,
            &mut m.indication_cues,
            &mut m.indication_stop_words,
            &mut m.indication_rejected_leads,
        ] {
            lower_all(list);
        }
        lower_synonyms(&mut m.units);
        lower_synonyms(&mut m.routes);
        lower_synonyms(&mut m.frequencies);

        let a = &mut self.allergies;
        for list in [
            &mut a.triggers,
            &mut a.context_words,
            &mut a.no_known,
            &mut a.allergens,
            &mut a.reactions,
            &mut a.list_stop_words,
            &mut a.determiners,
        ] {
            lower_all(list);
        }
        lower_synonyms(&mut a.severity);
    }

    fn validate(&self) -> MedscribeResult<()> {
        if self.negation.window == 0 {
            return Err(config_error("negation.window must be at least 1"));
        }
        require_non_empty("negation.cues", &self.negation.cues)?;
        require_non_empty("complaints.triggers", &self.complaints.triggers)?;
        require_non_empty("complaints.profiles", &self.complaints.profiles)?;
        require_non_empty("symptoms", &self.symptoms)?;
        require_non_empty("medications.drugs", &self.medications.drugs)?;
        require_non_empty("medications.units", &self.medications.units)?;

        let symptom_names: HashSet<&str> = self.symptoms.iter().map(|s| s.name.as_str()).collect();
        if symptom_names.len() != self.symptoms.len() {
            return Err(config_error("symptom names must be unique"));
        }

        let referenced = self
            .complaints
            .profiles
            .iter()
            .flat_map(|p| p.expected_symptoms.iter().map(move |s| (p.name.as_str(), s)))
            .chain(
                self.complaints
                    .general_review
                    .iter()
                    .map(|s| ("general_review", s)),
            );
        for (owner, symptom) in referenced {
            if !symptom_names.contains(symptom.as_str()) {
                warn!(owner, symptom = %symptom, "unknown symptom referenced by complaint profile");
                return Err(config_error(&format!(
                    "'{}' references unknown symptom '{}'",
                    owner, symptom
                )));
            }
        }

        let mut drug_names = HashSet::new();
        for drug in &self.medications.drugs {
            if drug.name.trim().is_empty() {
                return Err(config_error("drug names must not be empty"));
            }
            if !drug_names.insert(drug.name.to_lowercase()) {
                return Err(config_error(&format!("duplicate drug '{}'", drug.name)));
            }
        }

        for entry in self.symptoms.iter().chain(self.conditions.iter()) {
            if entry.name.trim().is_empty() {
                return Err(config_error("term names must not be empty"));
            }
        }

        Ok(())
    }
}

fn config_error(reason: &str) -> MedscribeError {
    MedscribeError::ConfigError {
        reason: format!("invalid lexicon: {}", reason),
    }
}

fn require_non_empty<T>(field: &str, list: &[T]) -> MedscribeResult<()> {
    if list.is_empty() {
        Err(config_error(&format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

fn lower_all(list: &mut Vec<String>) {
    for phrase in list.iter_mut() {
        *phrase = phrase.trim().to_lowercase();
    }
    list.retain(|p| !p.is_empty());
}

fn lower_synonyms<T>(list: &mut [Synonyms<T>]) {
    for entry in list {
        lower_all(&mut entry.aliases);
    }
}

fn ensure_first(aliases: &mut Vec<String>, name: &str) {
    aliases.retain(|a| a != name);
    aliases.insert(0, name.to_string());
}

fn normalize_entry(entry: &mut TermEntry) {
    entry.name = entry.name.trim().to_string();
    lower_all(&mut entry.aliases);
    let lowered = entry.name.to_lowercase();
    ensure_first(&mut entry.aliases, &lowered);
}
