//! Vocabulary types and configuration schema.
//!
//! A `Lexicon` is deserialized from TOML and holds every curated term list
//! the pipeline consults. All phrase lists are lowercased at load time, so
//! matching code can compare against lowercased transcript text directly.
//!
//! Phrase lists are matched whole-word. Where a list is documented as
//! "ordered", the first entry that matches wins.

use serde::{Deserialize, Serialize};

use medscribe_contracts::medication::{AllergySeverity, DoseUnit, Frequency, Route};

/// A canonical term with its spoken variants.
///
/// After loading, `aliases` always contains the lowercased `name` first, so
/// callers only ever need to scan `aliases`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermEntry {
    /// Canonical name reported in output (case preserved).
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A typed value with the phrases that express it, e.g. `PO` ← "by mouth".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synonyms<T> {
    pub value: T,
    pub aliases: Vec<String>,
}

/// Negation scope configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegationLexicon {
    /// Word budget of the preceding window.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Word budget of the trailing window.
    #[serde(default = "default_trailing_window")]
    pub trailing_window: usize,
    /// Cues that negate a following term ("denies", "negative for").
    pub cues: Vec<String>,
    /// Phrases that contain a cue word but do not negate ("no change").
    #[serde(default)]
    pub pseudo_cues: Vec<String>,
    /// Cues that negate a preceding term ("ruled out").
    #[serde(default)]
    pub post_cues: Vec<String>,
    /// Markers that re-affirm a term after a cue ("reports", "has").
    #[serde(default)]
    pub affirmations: Vec<String>,
    /// Words that close a negation scope ("but", "however").
    #[serde(default)]
    pub scope_terminators: Vec<String>,
    /// Words joining list items; they reset the window budget.
    #[serde(default)]
    pub list_connectors: Vec<String>,
    /// Answers that deny a preceding question ("no", "nope").
    #[serde(default)]
    pub denial_answers: Vec<String>,
    /// Answers that affirm a preceding question ("yes").
    #[serde(default)]
    pub affirm_answers: Vec<String>,
}

fn default_window() -> usize {
    5
}

fn default_trailing_window() -> usize {
    3
}

/// A canonical complaint and the symptoms worth asking about with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintProfile {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Whether the complaint denotes pain (enables location and radiation).
    #[serde(default)]
    pub pain: bool,
    /// Symptom names; each must exist in the symptom vocabulary.
    pub expected_symptoms: Vec<String>,
}

/// Chief complaint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintLexicon {
    /// Narrative triggers; the earliest occurrence in the transcript wins.
    pub triggers: Vec<String>,
    /// Words that end a captured complaint clause.
    pub clause_stop_words: Vec<String>,
    /// Leading words stripped from a captured clause.
    #[serde(default)]
    pub determiners: Vec<String>,
    /// Captured clauses starting with one of these are not complaints.
    #[serde(default)]
    pub rejected_leads: Vec<String>,
    /// A captured clause must be shorter than this many characters.
    #[serde(default = "default_max_clause_chars")]
    pub max_clause_chars: usize,
    /// Symptoms reviewed when no complaint profile applies.
    pub general_review: Vec<String>,
    /// Canonical complaints, ordered: the first present one is the fallback.
    pub profiles: Vec<ComplaintProfile>,
}

fn default_max_clause_chars() -> usize {
    30
}

/// Descriptive severity words, checked severe → moderate → mild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityBuckets {
    pub severe: Vec<String>,
    pub moderate: Vec<String>,
    pub mild: Vec<String>,
}

/// Qualifier vocabulary for the chief complaint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacteristicLexicon {
    /// Quality adjectives, ordered.
    pub qualities: Vec<String>,
    pub severity: SeverityBuckets,
    /// Anatomic locations, ordered. Only used for pain complaints.
    pub locations: Vec<String>,
    /// Phrases introducing a radiation site ("radiating to").
    #[serde(default)]
    pub radiation_cues: Vec<String>,
}

/// Onset and progression keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineLexicon {
    /// Onset triggers, ordered.
    pub onset_triggers: Vec<String>,
    /// A trigger only yields an onset when one of these follows it.
    pub time_keywords: Vec<String>,
    /// Word budget after an onset trigger.
    #[serde(default = "default_onset_window")]
    pub onset_window: usize,
    pub worsening: Vec<String>,
    pub improving: Vec<String>,
    pub stable: Vec<String>,
}

fn default_onset_window() -> usize {
    8
}

/// Drug vocabulary and dosing grammar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationLexicon {
    /// Canonical drugs; brand names are aliases of the generic.
    pub drugs: Vec<TermEntry>,
    pub units: Vec<Synonyms<DoseUnit>>,
    pub routes: Vec<Synonyms<Route>>,
    pub frequencies: Vec<Synonyms<Frequency>>,
    pub home_cues: Vec<String>,
    pub administered_cues: Vec<String>,
    /// Phrases introducing an indication ("for").
    pub indication_cues: Vec<String>,
    /// Words that end an indication phrase.
    #[serde(default)]
    pub indication_stop_words: Vec<String>,
    /// Indication phrases starting with one of these are durations, not
    /// conditions ("for years").
    #[serde(default)]
    pub indication_rejected_leads: Vec<String>,
    /// Maximum words in an indication.
    #[serde(default = "default_indication_words")]
    pub indication_max_words: usize,
}

fn default_indication_words() -> usize {
    5
}

/// Allergy vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyLexicon {
    /// Phrases followed by an allergen list ("allergic to").
    pub triggers: Vec<String>,
    /// Words marking a clause as allergy talk.
    pub context_words: Vec<String>,
    /// Explicit no-known-allergies statements.
    pub no_known: Vec<String>,
    /// Known allergens picked up anywhere in an allergy clause.
    pub allergens: Vec<String>,
    /// Reaction vocabulary.
    pub reactions: Vec<String>,
    /// Severity tiers, checked in order.
    pub severity: Vec<Synonyms<AllergySeverity>>,
    /// Words that end an allergen item.
    #[serde(default)]
    pub list_stop_words: Vec<String>,
    #[serde(default)]
    pub determiners: Vec<String>,
}

/// The complete vocabulary configuration.
///
/// Example:
/// ```toml
/// [negation]
/// window = 5
/// cues = ["denies", "no", "without"]
///
/// [[symptoms]]
/// name = "shortness of breath"
/// aliases = ["sob", "dyspnea"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub negation: NegationLexicon,
    pub complaints: ComplaintLexicon,
    pub symptoms: Vec<TermEntry>,
    pub characteristics: CharacteristicLexicon,
    pub timeline: TimelineLexicon,
    /// Medical history conditions.
    #[serde(default)]
    pub conditions: Vec<TermEntry>,
    pub medications: MedicationLexicon,
    pub allergies: AllergyLexicon,
}

impl Lexicon {
    /// Look up a symptom by canonical name.
    pub fn symptom(&self, name: &str) -> Option<&TermEntry> {
        self.symptoms.iter().find(|s| s.name == name)
    }

    /// The first complaint profile whose name or an alias occurs as a whole
    /// phrase inside `complaint`.
    pub fn profile_for(&self, complaint: &str) -> Option<&ComplaintProfile> {
        let complaint = complaint.to_lowercase();
        self.complaints.profiles.iter().find(|p| {
            p.aliases
                .iter()
                .any(|alias| contains_phrase(&complaint, alias))
        })
    }
}

/// Whole-word containment over whitespace-separated words.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let hay: Vec<&str> = haystack.split_whitespace().collect();
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    !needle.is_empty() && hay.windows(needle.len()).any(|w| w == needle.as_slice())
}
