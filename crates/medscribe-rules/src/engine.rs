//! TOML-driven red-flag evaluator.
//!
//! `TomlRedFlagDetector` loads a `RuleBank` from a TOML string or file and
//! implements the `RedFlagDetector` trait from medscribe-core.
//!
//! Evaluation algorithm, applied to every rule-set independently:
//!
//! 1. Test each finding's predicate against the encounter and transcript.
//! 2. Confidence = matched weight / total weight, clamped to `[0, 1]`.
//! 3. The rule-set fires when the matched-finding count and the confidence
//!    both reach the bank's thresholds.
//! 4. Fired rule-sets are returned ranked: severity, then confidence, then
//!    category order.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use medscribe_contracts::{
    alert::{sort_red_flags, RedFlag},
    encounter::ClinicalEncounter,
    error::{MedscribeError, MedscribeResult},
};
use medscribe_core::traits::RedFlagDetector;
use medscribe_extract::{Document, NegationResolver, PhraseSet};
use medscribe_lexicon::{Lexicon, NegationLexicon, TermEntry};

use crate::rule::{Finding, Predicate, RuleBank, RuleSet, Thresholds};

/// The 15-condition rule bank shipped with the crate.
pub const BUILTIN_RULES: &str = include_str!("../rules/red_flags.toml");

/// Appended to a finding label when it matched on a vital that needs
/// verification.
const UNVERIFIED_SUFFIX: &str = " (unverified)";

/// Result of testing one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Miss,
    Hit,
    /// Matched, but only on an implausible vital reading.
    UnverifiedHit,
}

/// A finding with its phrase lists compiled.
#[derive(Debug, Clone)]
struct CompiledFinding {
    finding: Finding,
    phrases: Option<PhraseSet>,
}

#[derive(Debug, Clone)]
struct CompiledRuleSet {
    rule_set: RuleSet,
    findings: Vec<CompiledFinding>,
    total_weight: f64,
}

/// Everything a predicate may look at, prepared once per `detect` call.
struct Evidence<'a> {
    encounter: &'a ClinicalEncounter,
    transcript: Document,
    complaint: Document,
}

/// A `RedFlagDetector` that reads its rule-sets from a TOML document.
///
/// ```rust,ignore
/// use medscribe_rules::TomlRedFlagDetector;
///
/// let detector = TomlRedFlagDetector::from_file(Path::new("rules/red_flags.toml"), &lexicon.negation)?;
/// ```
#[derive(Debug)]
pub struct TomlRedFlagDetector {
    thresholds: Thresholds,
    rule_sets: Vec<CompiledRuleSet>,
    negation: NegationResolver,
}

impl TomlRedFlagDetector {
    /// Parse `s` as TOML and build a detector.
    ///
    /// `negation` decides whether a `text` finding's occurrence is affirmed.
    /// Returns `MedscribeError::ConfigError` if the TOML is malformed, and
    /// `MedscribeError::InvalidRuleSet` if a rule-set fails validation.
    pub fn from_toml_str(s: &str, negation: &NegationLexicon) -> MedscribeResult<Self> {
        let bank: RuleBank = toml::from_str(s).map_err(|e| MedscribeError::ConfigError {
            reason: format!("failed to parse rule bank TOML: {}", e),
        })?;
        Self::from_bank(bank, negation)
    }

    /// Read the file at `path` and parse it as a rule bank.
    pub fn from_file(path: &Path, negation: &NegationLexicon) -> MedscribeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MedscribeError::ConfigError {
            reason: format!("failed to read rule bank file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents, negation)
    }

    /// The built-in 15-condition rule bank.
    pub fn builtin(negation: &NegationLexicon) -> MedscribeResult<Self> {
        Self::from_toml_str(BUILTIN_RULES, negation)
    }

    pub fn from_bank(bank: RuleBank, negation: &NegationLexicon) -> MedscribeResult<Self> {
        validate(&bank)?;
        let rule_sets = bank
            .rule_sets
            .into_iter()
            .map(|rule_set| CompiledRuleSet {
                total_weight: rule_set.total_weight(),
                findings: rule_set
                    .findings
                    .iter()
                    .map(|finding| CompiledFinding {
                        phrases: compile(&finding.when),
                        finding: finding.clone(),
                    })
                    .collect(),
                rule_set,
            })
            .collect::<Vec<_>>();
        debug!(rule_sets = rule_sets.len(), "rule bank loaded");
        Ok(Self {
            thresholds: bank.thresholds,
            rule_sets,
            negation: NegationResolver::new(negation),
        })
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn rule_set_count(&self) -> usize {
        self.rule_sets.len()
    }

    /// Check that every symptom, condition and drug a finding names exists
    /// in `lexicon`. A name the extractors can never produce would make its
    /// finding unreachable.
    pub fn check_vocabulary(&self, lexicon: &Lexicon) -> MedscribeResult<()> {
        for compiled in &self.rule_sets {
            for finding in &compiled.rule_set.findings {
                let (names, kind, entries) = match &finding.when {
                    Predicate::Symptom { names } => (names, "symptom", lexicon.symptoms.as_slice()),
                    Predicate::History { conditions } => {
                        (conditions, "condition", lexicon.conditions.as_slice())
                    }
                    Predicate::Medication { names } => {
                        (names, "drug", lexicon.medications.drugs.as_slice())
                    }
                    _ => continue,
                };
                if let Some(unknown) = names.iter().find(|n| !is_known(entries, n)) {
                    return Err(MedscribeError::InvalidRuleSet {
                        rule_set: compiled.rule_set.category.to_string(),
                        reason: format!(
                            "finding '{}' names unknown {} '{}'",
                            finding.label, kind, unknown
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, compiled: &CompiledRuleSet, evidence: &Evidence<'_>) -> Option<RedFlag> {
        let rule_set = &compiled.rule_set;
        let mut matched_weight = 0.0;
        let mut matched_findings = Vec::new();

        for CompiledFinding { finding, phrases } in &compiled.findings {
            match self.test(&finding.when, phrases.as_ref(), evidence) {
                Outcome::Miss => continue,
                Outcome::Hit => matched_findings.push(finding.label.clone()),
                Outcome::UnverifiedHit => {
                    matched_findings.push(format!("{}{}", finding.label, UNVERIFIED_SUFFIX))
                }
            }
            matched_weight += finding.weight;
        }

        let confidence = if compiled.total_weight > 0.0 {
            (matched_weight / compiled.total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };

        debug!(
            category = %rule_set.category,
            matched = matched_findings.len(),
            confidence,
            "rule-set evaluated"
        );

        if matched_findings.len() < self.thresholds.min_findings
            || confidence < self.thresholds.min_confidence
        {
            return None;
        }

        info!(
            category = %rule_set.category,
            severity = %rule_set.severity,
            confidence,
            "red flag fired"
        );

        Some(RedFlag {
            category: rule_set.category,
            severity: rule_set.severity,
            confidence,
            matched_findings,
            recommendation: rule_set.recommendation.clone(),
        })
    }

    fn test(
        &self,
        predicate: &Predicate,
        phrases: Option<&PhraseSet>,
        evidence: &Evidence<'_>,
    ) -> Outcome {
        let encounter = evidence.encounter;
        let hit = match predicate {
            Predicate::Text { affirmed, .. } => phrases.is_some_and(|set| {
                set.find_all(&evidence.transcript).into_iter().any(|m| {
                    !*affirmed
                        || !self
                            .negation
                            .span_polarity(&evidence.transcript, m.span)
                            .is_denied()
                })
            }),
            Predicate::Complaint { .. } => {
                phrases.is_some_and(|set| !set.find_all(&evidence.complaint).is_empty())
            }
            Predicate::Symptom { names } => names
                .iter()
                .any(|n| encounter.associated_symptoms.contains(&n.to_lowercase())),
            Predicate::History { conditions } => conditions
                .iter()
                .any(|c| encounter.medical_history.contains(&c.to_lowercase())),
            Predicate::Medication { names } => encounter
                .medications
                .iter()
                .any(|m| names.iter().any(|n| n.eq_ignore_ascii_case(&m.name))),
            Predicate::AllergySeverity { severity } => encounter
                .allergies
                .iter()
                .any(|a| a.severity.is_some_and(|s| s >= *severity)),
            Predicate::Vital { vital, above, below } => {
                let Some(reading) = encounter.vitals.and_then(|v| v.reading(*vital)) else {
                    return Outcome::Miss;
                };
                let beyond = above.map_or(false, |limit| reading.value > limit)
                    || below.map_or(false, |limit| reading.value < limit);
                if beyond && reading.needs_verification {
                    return Outcome::UnverifiedHit;
                }
                beyond
            }
        };
        if hit {
            Outcome::Hit
        } else {
            Outcome::Miss
        }
    }
}

impl RedFlagDetector for TomlRedFlagDetector {
    fn detect(&self, encounter: &ClinicalEncounter, transcript: &str) -> Vec<RedFlag> {
        let evidence = Evidence {
            encounter,
            transcript: Document::new(transcript),
            complaint: Document::new(&encounter.chief_complaint),
        };
        let mut flags: Vec<RedFlag> = self
            .rule_sets
            .iter()
            .filter_map(|compiled| self.evaluate(compiled, &evidence))
            .collect();
        sort_red_flags(&mut flags);
        flags
    }
}

fn is_known(entries: &[TermEntry], name: &str) -> bool {
    entries.iter().any(|e| e.name.eq_ignore_ascii_case(name))
}

fn compile(predicate: &Predicate) -> Option<PhraseSet> {
    match predicate {
        Predicate::Text { terms, .. } | Predicate::Complaint { terms } => {
            Some(PhraseSet::new(terms))
        }
        _ => None,
    }
}

/// Reject rule-sets that would silently never fire or score nonsensically.
fn validate(bank: &RuleBank) -> MedscribeResult<()> {
    let t = bank.thresholds;
    if !(0.0..=1.0).contains(&t.min_confidence) {
        return Err(MedscribeError::ConfigError {
            reason: format!(
                "threshold min_confidence must be within [0, 1], got {}",
                t.min_confidence
            ),
        });
    }

    let mut seen = HashSet::new();
    for rule_set in &bank.rule_sets {
        let invalid = |reason: String| MedscribeError::InvalidRuleSet {
            rule_set: rule_set.category.to_string(),
            reason,
        };
        if !seen.insert(rule_set.category) {
            return Err(invalid("category declared more than once".to_string()));
        }
        if rule_set.findings.is_empty() {
            return Err(invalid("rule-set has no findings".to_string()));
        }
        if rule_set.recommendation.trim().is_empty() {
            return Err(invalid("recommendation is empty".to_string()));
        }
        for finding in &rule_set.findings {
            if !finding.weight.is_finite() || finding.weight <= 0.0 {
                return Err(invalid(format!(
                    "finding '{}' has non-positive weight {}",
                    finding.label, finding.weight
                )));
            }
            let empty_terms = match &finding.when {
                Predicate::Text { terms, .. } | Predicate::Complaint { terms } => terms.is_empty(),
                Predicate::Symptom { names } | Predicate::Medication { names } => names.is_empty(),
                Predicate::History { conditions } => conditions.is_empty(),
                Predicate::Vital { above, below, .. } => above.is_none() && below.is_none(),
                Predicate::AllergySeverity { .. } => false,
            };
            if empty_terms {
                return Err(invalid(format!(
                    "finding '{}' has nothing to match",
                    finding.label
                )));
            }
        }
    }
    Ok(())
}
