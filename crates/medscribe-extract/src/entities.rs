//! Entity extraction: complaint, qualifiers, timeline, symptoms, history,
//! and vitals.
//!
//! Every symptom and history check goes through the negation resolver, so a
//! denied mention is never reported as present. Nothing here can fail;
//! fields that cannot be found stay empty.

use std::collections::BTreeSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use medscribe_contracts::encounter::{
    ClinicalEncounter, Progression, Timeline, UNCLEAR_CHIEF_COMPLAINT,
};
use medscribe_contracts::negation::Polarity;
use medscribe_core::traits::EncounterExtractor;
use medscribe_lexicon::Lexicon;

use crate::negation::NegationResolver;
use crate::text::{Document, PhraseSet, Span};
use crate::vitals::extract_vitals;

static NUMERIC_SEVERITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(10|[0-9])\s*(?:/|out of)\s*10\b").expect("numeric severity pattern")
});

const COUNT: &str = r"(\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|twelve|a couple of|a few|few|several)";
const UNIT: &str = r"(minute|hour|day|week|month|year)s?";

static DURATION_FOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:for|lasting|over|about|x)\s+(?:the\s+)?(?:(?:last|past)\s+)?{COUNT}\s+{UNIT}\b"
    ))
    .expect("duration pattern")
});

static DURATION_AGO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b{COUNT}\s+{UNIT}\s+ago\b")).expect("duration-ago pattern")
});

/// Words that may precede a radiation site ("radiating to the back").
const SITE_DETERMINERS: [&str; 5] = ["the", "my", "his", "her", "a"];

/// Maximum words captured for a radiation site.
const RADIATION_WORDS: usize = 2;

/// A canonical term with its aliases compiled.
#[derive(Debug, Clone)]
struct CompiledTerm {
    name: String,
    aliases: PhraseSet,
}

/// The rule-based `EncounterExtractor`.
///
/// Construct once per lexicon; the compiled phrase sets are reused across
/// transcripts and never mutated.
pub struct EntityExtractor {
    lexicon: Arc<Lexicon>,
    negation: NegationResolver,
    triggers: PhraseSet,
    clause_stops: PhraseSet,
    /// Determiners plus quality and severity words, stripped from the front
    /// of a captured complaint so "severe crushing chest pain" yields
    /// "chest pain".
    complaint_fillers: PhraseSet,
    rejected_leads: PhraseSet,
    profiles: Vec<PhraseSet>,
    symptoms: Vec<CompiledTerm>,
    conditions: Vec<CompiledTerm>,
    qualities: PhraseSet,
    severity: [(String, PhraseSet); 3],
    locations: PhraseSet,
    radiation_cues: PhraseSet,
    onset_triggers: PhraseSet,
    time_keywords: PhraseSet,
    progression: [(Progression, PhraseSet); 3],
    no_known_allergies: PhraseSet,
}

impl EntityExtractor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        let complaints = &lexicon.complaints;
        let characteristics = &lexicon.characteristics;
        let timeline = &lexicon.timeline;

        let fillers: Vec<&String> = complaints
            .determiners
            .iter()
            .chain(&characteristics.qualities)
            .chain(&characteristics.severity.severe)
            .chain(&characteristics.severity.moderate)
            .chain(&characteristics.severity.mild)
            .collect();

        let compile = |terms: &[medscribe_lexicon::TermEntry]| -> Vec<CompiledTerm> {
            terms
                .iter()
                .map(|t| CompiledTerm {
                    name: t.name.clone(),
                    aliases: PhraseSet::new(&t.aliases),
                })
                .collect()
        };

        Self {
            negation: NegationResolver::new(&lexicon.negation),
            triggers: PhraseSet::new(&complaints.triggers),
            clause_stops: PhraseSet::new(&complaints.clause_stop_words),
            complaint_fillers: PhraseSet::new(&fillers),
            rejected_leads: PhraseSet::new(&complaints.rejected_leads),
            profiles: complaints
                .profiles
                .iter()
                .map(|p| PhraseSet::new(&p.aliases))
                .collect(),
            symptoms: compile(&lexicon.symptoms),
            conditions: compile(&lexicon.conditions),
            qualities: PhraseSet::new(&characteristics.qualities),
            severity: [
                ("severe".to_string(), PhraseSet::new(&characteristics.severity.severe)),
                ("moderate".to_string(), PhraseSet::new(&characteristics.severity.moderate)),
                ("mild".to_string(), PhraseSet::new(&characteristics.severity.mild)),
            ],
            locations: PhraseSet::new(&characteristics.locations),
            radiation_cues: PhraseSet::new(&characteristics.radiation_cues),
            onset_triggers: PhraseSet::new(&timeline.onset_triggers),
            time_keywords: PhraseSet::new(&timeline.time_keywords),
            progression: [
                (Progression::Worsening, PhraseSet::new(&timeline.worsening)),
                (Progression::Improving, PhraseSet::new(&timeline.improving)),
                (Progression::Stable, PhraseSet::new(&timeline.stable)),
            ],
            no_known_allergies: PhraseSet::new(&lexicon.allergies.no_known),
            lexicon,
        }
    }

    /// Extract from an already-normalized document.
    pub fn extract_document(&self, doc: &Document) -> ClinicalEncounter {
        let chief_complaint = self.chief_complaint(doc);
        let characteristics = self.characteristics(doc, &chief_complaint);
        let timeline = Timeline {
            onset: self.onset(doc),
            progression: self.progression(doc),
        };

        let mut associated_symptoms = BTreeSet::new();
        let mut pertinent_negatives = BTreeSet::new();
        let mut conflicting_mentions = BTreeSet::new();
        for name in self.expected_symptoms(&chief_complaint) {
            let Some(symptom) = self.symptoms.iter().find(|s| s.name == *name) else {
                continue;
            };
            let resolution = self.negation.resolve_set(doc, &symptom.aliases);
            match resolution.polarity() {
                Polarity::Present => {
                    associated_symptoms.insert(symptom.name.clone());
                }
                Polarity::Denied => {
                    pertinent_negatives.insert(symptom.name.clone());
                }
                Polarity::Unknown => continue,
            }
            if resolution.is_conflicting() {
                conflicting_mentions.insert(symptom.name.clone());
            }
        }

        let medical_history: BTreeSet<String> = self
            .conditions
            .iter()
            .filter(|c| self.negation.resolve_set(doc, &c.aliases).polarity().is_present())
            .map(|c| c.name.clone())
            .collect();

        let no_known_allergies = !self.no_known_allergies.find_all(doc).is_empty();

        debug!(
            clear_complaint = chief_complaint != UNCLEAR_CHIEF_COMPLAINT,
            characteristics = characteristics.len(),
            associated = associated_symptoms.len(),
            negatives = pertinent_negatives.len(),
            history = medical_history.len(),
            "encounter extracted"
        );

        ClinicalEncounter {
            chief_complaint,
            characteristics,
            timeline,
            associated_symptoms,
            pertinent_negatives,
            conflicting_mentions,
            medical_history,
            medications: Vec::new(),
            allergies: Vec::new(),
            no_known_allergies,
            vitals: extract_vitals(doc.text()),
        }
    }

    // ── Chief complaint ──────────────────────────────────────────────────────

    fn chief_complaint(&self, doc: &Document) -> String {
        if let Some(complaint) = self.narrative_complaint(doc) {
            return complaint;
        }
        let fallback = self
            .lexicon
            .complaints
            .profiles
            .iter()
            .zip(&self.profiles)
            .find(|(_, aliases)| self.negation.resolve_set(doc, aliases).polarity().is_present());
        match fallback {
            Some((profile, _)) => profile.name.clone(),
            None => UNCLEAR_CHIEF_COMPLAINT.to_string(),
        }
    }

    /// The clause after the earliest non-negated trigger that yields a usable
    /// complaint. A complaint whose last mention is denied is not used.
    fn narrative_complaint(&self, doc: &Document) -> Option<String> {
        self.triggers
            .find_all(doc)
            .into_iter()
            .filter(|m| !self.negation.span_polarity(doc, m.span).is_denied())
            .filter_map(|m| self.capture_complaint(doc, m.span.end))
            .find(|(span, _)| !self.retracted(doc, *span))
            .map(|(_, complaint)| complaint)
    }

    /// True when the captured words are denied at their last mention.
    fn retracted(&self, doc: &Document, captured: Span) -> bool {
        let words = PhraseSet::new(&[doc.slice(captured)]);
        self.negation.resolve_set(doc, &words).polarity().is_denied()
    }

    fn capture_complaint(&self, doc: &Document, start: usize) -> Option<(Span, String)> {
        if start >= doc.len() || self.rejected_leads.longest_at(doc, start).is_some() {
            return None;
        }
        let clause_end = doc.clause_bounds(start).end;

        let mut begin = start;
        while let Some((_, end)) = self.complaint_fillers.longest_at(doc, begin) {
            if end > clause_end {
                break;
            }
            begin = end;
        }
        if self.rejected_leads.longest_at(doc, begin).is_some() {
            return None;
        }

        // A capture of `max_chars` words is already too long.
        let max_chars = self.lexicon.complaints.max_clause_chars;
        let mut end = begin;
        while end < clause_end
            && end - begin < max_chars
            && doc.is_word(end)
            && self.clause_stops.longest_at(doc, end).is_none()
        {
            end += 1;
        }
        let span = Span::new(begin, end);
        let clause = doc.slice(span);
        if clause.is_empty() || clause.len() >= max_chars {
            return None;
        }

        // Spoken variants of a known symptom are reported by canonical name;
        // a longer capture naming a known complaint snaps to that complaint.
        let canonical = self
            .lexicon
            .symptoms
            .iter()
            .find(|s| s.aliases.iter().any(|a| a == clause))
            .map(|s| s.name.as_str())
            .or_else(|| self.profile_within(doc, span))
            .unwrap_or(clause);
        Some((span, canonical.to_string()))
    }

    /// The complaint profile with the leftmost alias inside `span`.
    fn profile_within(&self, doc: &Document, span: Span) -> Option<&str> {
        self.profiles
            .iter()
            .enumerate()
            .filter_map(|(index, aliases)| {
                aliases.first_in(doc, span.start..span.end).map(|m| (m.span.start, index))
            })
            .min()
            .map(|(_, index)| self.lexicon.complaints.profiles[index].name.as_str())
    }

    // ── Characteristics ──────────────────────────────────────────────────────

    /// Qualifiers in fixed order: quality, severity, location, radiation,
    /// duration.
    fn characteristics(&self, doc: &Document, complaint: &str) -> Vec<String> {
        let mut out = Vec::new();

        if let Some(quality) = self.first_in_list_order(doc, &self.qualities) {
            out.push(format!("quality: {}", self.lexicon.characteristics.qualities[quality]));
        }
        if let Some(severity) = self.severity(doc) {
            out.push(format!("severity: {severity}"));
        }

        let is_pain = self
            .lexicon
            .profile_for(complaint)
            .map_or_else(|| complaint.split_whitespace().any(|w| w == "pain"), |p| p.pain);
        if is_pain {
            let radiation = self.radiation(doc);
            let radiation_span = radiation.as_ref().map(|(span, _)| *span);
            if let Some(location) = self.location(doc, radiation_span) {
                out.push(format!("location: {location}"));
            }
            if let Some((_, site)) = radiation {
                out.push(format!("radiation: {site}"));
            }
        }

        if let Some(duration) = duration(doc.text()) {
            out.push(format!("duration: {duration}"));
        }
        out
    }

    /// Index of the first phrase, in list order, with a non-negated
    /// occurrence.
    fn first_in_list_order(&self, doc: &Document, set: &PhraseSet) -> Option<usize> {
        set.find_all(doc)
            .into_iter()
            .filter(|m| !self.negation.span_polarity(doc, m.span).is_denied())
            .map(|m| m.phrase)
            .min()
    }

    /// A numeric score, else the bucket of the earliest non-negated
    /// descriptor ("not severe, just mild" is mild).
    fn severity(&self, doc: &Document) -> Option<String> {
        if let Some(caps) = NUMERIC_SEVERITY.captures(doc.text()) {
            return Some(format!("{}/10", &caps[1]));
        }
        self.severity
            .iter()
            .flat_map(|(bucket, words)| words.find_all(doc).into_iter().map(move |m| (m.span, bucket)))
            .filter(|(span, _)| !self.negation.span_polarity(doc, *span).is_denied())
            .min_by_key(|(span, _)| span.start)
            .map(|(_, bucket)| bucket.clone())
    }

    /// First location in list order that is not itself a radiation site.
    fn location(&self, doc: &Document, radiation: Option<Span>) -> Option<&str> {
        self.locations
            .find_all(doc)
            .into_iter()
            .filter(|m| radiation.map_or(true, |r| !r.overlaps(m.span)))
            .map(|m| m.phrase)
            .min()
            .map(|index| self.lexicon.characteristics.locations[index].as_str())
    }

    /// The site after the first radiation cue, with its token span.
    fn radiation(&self, doc: &Document) -> Option<(Span, String)> {
        self.radiation_cues.find_all(doc).into_iter().find_map(|cue| {
            let clause_end = doc.clause_bounds(cue.span.start).end;
            let mut start = cue.span.end;
            while start < clause_end && SITE_DETERMINERS.contains(&doc.tokens()[start].text.as_str()) {
                start += 1;
            }
            let mut end = start;
            while end < clause_end
                && end - start < RADIATION_WORDS
                && doc.is_word(end)
                && self.is_site_word(doc, end)
            {
                end += 1;
            }
            let span = Span::new(start, end);
            (!span.is_empty()).then(|| (span, doc.slice(span).to_string()))
        })
    }

    fn is_site_word(&self, doc: &Document, pos: usize) -> bool {
        let word = doc.tokens()[pos].text.as_str();
        word != "and" && word != "or" && self.clause_stops.longest_at(doc, pos).is_none()
    }

    // ── Timeline ─────────────────────────────────────────────────────────────

    /// From the first onset trigger (in list order) followed by a time
    /// keyword, through the last keyword within the onset window.
    fn onset(&self, doc: &Document) -> Option<String> {
        let window = self.lexicon.timeline.onset_window;
        let mut candidates: Vec<(usize, Span)> = Vec::new();

        for trigger in self.onset_triggers.find_all(doc) {
            let clause_end = doc.clause_bounds(trigger.span.start).end;
            let mut words = 0;
            let mut last_keyword_end = None;
            let mut pos = trigger.span.end;
            while pos < clause_end && words < window {
                if let Some((_, end)) = self.time_keywords.longest_at(doc, pos) {
                    last_keyword_end = Some(end);
                    words += end - pos;
                    pos = end;
                    continue;
                }
                if doc.is_word(pos) {
                    words += 1;
                }
                pos += 1;
            }
            if let Some(end) = last_keyword_end {
                candidates.push((trigger.phrase, Span::new(trigger.span.start, end)));
            }
        }

        candidates
            .into_iter()
            .min_by_key(|(phrase, span)| (*phrase, span.start))
            .map(|(_, span)| doc.slice(span).to_string())
    }

    /// First bucket with a non-negated keyword wins; keywords that only
    /// occur negated make the progression unknown.
    fn progression(&self, doc: &Document) -> Option<Progression> {
        let mut saw_negated = false;
        for (progression, words) in &self.progression {
            for m in words.find_all(doc) {
                if self.negation.span_polarity(doc, m.span).is_denied() {
                    saw_negated = true;
                } else {
                    return Some(*progression);
                }
            }
        }
        saw_negated.then_some(Progression::Unknown)
    }

    // ── Symptoms ─────────────────────────────────────────────────────────────

    fn expected_symptoms(&self, complaint: &str) -> &[String] {
        let complaints = &self.lexicon.complaints;
        if complaint == UNCLEAR_CHIEF_COMPLAINT {
            return &complaints.general_review;
        }
        self.lexicon
            .profile_for(complaint)
            .map_or(&complaints.general_review, |p| &p.expected_symptoms)
    }
}

impl EncounterExtractor for EntityExtractor {
    fn extract(&self, transcript: &str) -> ClinicalEncounter {
        self.extract_document(&Document::new(transcript))
    }
}

/// Duration from "for/lasting/about N units" or "N units ago", whichever
/// comes first in the text. Number words are normalized to digits.
fn duration(text: &str) -> Option<String> {
    let caps = [&*DURATION_FOR, &*DURATION_AGO]
        .into_iter()
        .filter_map(|re| re.captures(text))
        .min_by_key(|c| c.get(0).map_or(usize::MAX, |m| m.start()))?;
    let count = count_value(caps.get(1)?.as_str())?;
    let unit = caps.get(2)?.as_str();
    Some(if count == "1" {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    })
}

fn count_value(word: &str) -> Option<String> {
    if word.chars().all(|c| c.is_ascii_digit()) {
        return Some(word.trim_start_matches('0').to_string()).filter(|s| !s.is_empty());
    }
    let value = match word {
        "a" | "an" | "one" => "1",
        "two" | "a couple of" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        "ten" => "10",
        "twelve" => "12",
        "a few" | "few" => "a few",
        "several" => "several",
        _ => return None,
    };
    Some(value.to_string())
}

// ── Tests ────────────────────────────────────────────────────────────────────
