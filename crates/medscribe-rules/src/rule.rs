//! Red-flag rule types and configuration schema.
//!
//! A `RuleBank` is deserialized from TOML and holds one `RuleSet` per
//! condition. Every rule-set is a weighted list of findings; the evaluator
//! scores them all the same way, so adding a condition never needs code.

use serde::{Deserialize, Serialize};

use medscribe_contracts::alert::{AlertSeverity, RedFlagCategory};
use medscribe_contracts::medication::AllergySeverity;
use medscribe_contracts::vitals::VitalKind;

/// When a rule-set counts as fired.
///
/// Both conditions must hold: at least `min_findings` findings matched, and
/// the confidence reached `min_confidence`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_min_findings")]
    pub min_findings: usize,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_min_findings() -> usize {
    2
}

fn default_min_confidence() -> f64 {
    0.3
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_findings: default_min_findings(),
            min_confidence: default_min_confidence(),
        }
    }
}

/// What a finding looks for.
///
/// Expressed in TOML as an inline table tagged by `kind`:
/// ```toml
/// when = { kind = "text", terms = ["crushing", "elephant on my chest"] }
/// when = { kind = "vital", vital = "heart_rate", above = 120.0 }
/// when = { kind = "allergy_severity", severity = "severe" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Any term occurs in the transcript. With `affirmed` (the default) the
    /// occurrence must not be negated.
    Text {
        terms: Vec<String>,
        #[serde(default = "default_affirmed")]
        affirmed: bool,
    },
    /// Any of the named symptoms is among the associated symptoms.
    Symptom { names: Vec<String> },
    /// The chief complaint contains any of the terms.
    Complaint { terms: Vec<String> },
    /// Any condition is in the medical history.
    History { conditions: Vec<String> },
    /// The vital was captured and lies strictly beyond a bound.
    Vital {
        vital: VitalKind,
        #[serde(default)]
        above: Option<f64>,
        #[serde(default)]
        below: Option<f64>,
    },
    /// Any of the named drugs is on the medication list.
    Medication { names: Vec<String> },
    /// Some allergy is at least this severe.
    AllergySeverity { severity: AllergySeverity },
}

fn default_affirmed() -> bool {
    true
}

/// One weighted piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Shown in the alert when matched.
    pub label: String,
    pub weight: f64,
    pub when: Predicate,
}

/// The definition of one screened condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub category: RedFlagCategory,
    pub severity: AlertSeverity,
    pub recommendation: String,
    pub findings: Vec<Finding>,
}

impl RuleSet {
    pub fn total_weight(&self) -> f64 {
        self.findings.iter().map(|f| f.weight).sum()
    }
}

/// The top-level structure deserialized from a rule bank file.
///
/// Example:
/// ```toml
/// [thresholds]
/// min_findings = 2
/// min_confidence = 0.3
///
/// [[rule_sets]]
/// category = "stemi"
/// severity = "critical"
/// recommendation = "Obtain 12-lead ECG within 10 minutes."
///
/// [[rule_sets.findings]]
/// label = "chest pain"
/// weight = 3.0
/// when = { kind = "text", terms = ["chest pain"] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBank {
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Evaluated independently of one another.
    pub rule_sets: Vec<RuleSet>,
}
