//! Medication and allergy parsing.
//!
//! Each drug mention gets a local context window: forward up to the next
//! drug mention or the clause end, backward to the previous mention or list
//! separator. Dose, route, frequency and indication are read from that
//! window; origin comes from the nearest home/administered cue in the clause.
//! Mentions of the same drug merge into one record. Denied mentions ("not
//! taking warfarin") and mentions that are allergens are skipped.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use medscribe_contracts::medication::{
    Allergy, DoseUnit, Frequency, Medication, Origin, Route,
};
use medscribe_core::traits::MedicationParser;
use medscribe_lexicon::Lexicon;

use crate::allergies::AllergyExtractor;
use crate::negation::NegationResolver;
use crate::text::{Document, PhraseMatch, PhraseSet, Span, TokenKind};

static DOSE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+(?:\.\d+)?)\s*([a-z]+)\b").expect("dose pattern")
});

/// Words that end the backward window of a mention.
const LIST_SEPARATORS: [&str; 4] = ["and", "or", "then", "plus"];

/// A drug mention resolved to its canonical drug.
#[derive(Debug, Clone, Copy)]
struct Mention {
    span: Span,
    drug: usize,
}

/// The rule-based `MedicationParser`.
pub struct MedicationExtractor {
    lexicon: Arc<Lexicon>,
    negation: NegationResolver,
    allergies: AllergyExtractor,
    aliases: PhraseSet,
    /// Owning drug index for each entry of `aliases`.
    alias_owner: Vec<usize>,
    units: HashMap<String, DoseUnit>,
    routes: PhraseSet,
    route_values: Vec<Route>,
    frequencies: PhraseSet,
    frequency_values: Vec<Frequency>,
    home_cues: PhraseSet,
    administered_cues: PhraseSet,
    indication_cues: PhraseSet,
    indication_stops: PhraseSet,
    indication_rejected: PhraseSet,
}

impl MedicationExtractor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        let meds = &lexicon.medications;

        let mut alias_texts: Vec<&str> = Vec::new();
        let mut alias_owner = Vec::new();
        for (index, drug) in meds.drugs.iter().enumerate() {
            for alias in &drug.aliases {
                alias_texts.push(alias);
                alias_owner.push(index);
            }
        }

        let units = meds
            .units
            .iter()
            .flat_map(|u| u.aliases.iter().map(move |a| (a.clone(), u.value)))
            .collect();

        let (route_texts, route_values) = flatten(&meds.routes);
        let (frequency_texts, frequency_values) = flatten(&meds.frequencies);

        let negation = NegationResolver::new(&lexicon.negation);
        Self {
            allergies: AllergyExtractor::new(&lexicon.allergies, negation.clone()),
            negation,
            aliases: PhraseSet::new(&alias_texts),
            alias_owner,
            units,
            routes: PhraseSet::new(&route_texts),
            route_values,
            frequencies: PhraseSet::new(&frequency_texts),
            frequency_values,
            home_cues: PhraseSet::new(&meds.home_cues),
            administered_cues: PhraseSet::new(&meds.administered_cues),
            indication_cues: PhraseSet::new(&meds.indication_cues),
            indication_stops: PhraseSet::new(&meds.indication_stop_words),
            indication_rejected: PhraseSet::new(&meds.indication_rejected_leads),
            lexicon,
        }
    }

    /// Medications in order of first mention, one record per drug.
    pub fn medications_in(&self, doc: &Document) -> Vec<Medication> {
        let allergens = self.allergies.allergen_spans(doc);
        let mentions: Vec<Mention> = self
            .aliases
            .find_all(doc)
            .into_iter()
            .filter(|m| !allergens.iter().any(|a| a.overlaps(m.span)))
            .filter(|m| !self.negation.span_polarity(doc, m.span).is_denied())
            .map(|m| Mention {
                span: m.span,
                drug: self.alias_owner[m.phrase],
            })
            .collect();

        let cues = OriginCues {
            home: self.home_cues.find_all(doc),
            administered: self.administered_cues.find_all(doc),
        };
        let mut medications: Vec<Medication> = Vec::new();
        for (i, mention) in mentions.iter().enumerate() {
            let parsed = self.parse_mention(doc, &mentions, i, &cues);
            match medications.iter_mut().find(|m| m.name == parsed.name) {
                Some(existing) => existing.merge_missing(parsed),
                None => medications.push(parsed),
            }
            debug!(drug = %self.lexicon.medications.drugs[mention.drug].name, "medication mention");
        }
        debug!(count = medications.len(), "medications extracted");
        medications
    }

    pub fn allergies_in(&self, doc: &Document) -> Vec<Allergy> {
        self.allergies.extract(doc)
    }

    fn parse_mention(
        &self,
        doc: &Document,
        mentions: &[Mention],
        i: usize,
        cues: &OriginCues,
    ) -> Medication {
        let mention = mentions[i];
        let clause = doc.clause_bounds(mention.span.start);

        let forward_end = mentions
            .get(i + 1)
            .map(|next| next.span.start)
            .filter(|start| clause.contains(start))
            .unwrap_or(clause.end);
        let forward = mention.span.end..forward_end;

        let backward_start = i
            .checked_sub(1)
            .map(|p| mentions[p].span.end)
            .filter(|end| *end > clause.start)
            .unwrap_or(clause.start);
        let backward_start = (backward_start..mention.span.start)
            .rev()
            .find(|&p| is_list_separator(doc, p))
            .map_or(backward_start, |p| p + 1);
        let backward = backward_start..mention.span.start;

        let (dose, unit) = match self
            .dose_in(doc, forward.clone())
            .into_iter()
            .next()
            .or_else(|| self.dose_in(doc, backward.clone()).into_iter().last())
        {
            Some((dose, unit)) => (Some(dose), Some(unit)),
            None => (None, None),
        };

        let route = self
            .routes
            .first_in(doc, forward.clone())
            .or_else(|| self.routes.find_in(doc, backward).into_iter().last())
            .map(|m| self.route_values[m.phrase]);

        let frequency = self
            .frequencies
            .first_in(doc, forward.clone())
            .map(|m| self.frequency_values[m.phrase]);

        Medication {
            name: self.lexicon.medications.drugs[mention.drug].name.clone(),
            dose,
            unit,
            route,
            frequency,
            indication: self.indication(doc, forward),
            origin: cues.origin(mention.span, &clause),
        }
    }

    /// Every `<number> <unit>` pair in the range, in order.
    fn dose_in(&self, doc: &Document, range: Range<usize>) -> Vec<(String, DoseUnit)> {
        let text = doc.slice(Span::new(range.start, range.end));
        DOSE_PATTERN
            .captures_iter(text)
            .filter_map(|caps| {
                let unit = self.units.get(caps.get(2)?.as_str())?;
                Some((caps.get(1)?.as_str().to_string(), *unit))
            })
            .collect()
    }

    /// The phrase after "for", unless it reads as a duration.
    fn indication(&self, doc: &Document, range: Range<usize>) -> Option<String> {
        let max_words = self.lexicon.medications.indication_max_words;
        self.indication_cues
            .find_in(doc, range.clone())
            .into_iter()
            .find_map(|cue| {
                let start = cue.span.end;
                if self.indication_rejected.longest_at(doc, start).is_some()
                    || doc
                        .tokens()
                        .get(start)
                        .map_or(true, |t| t.text.starts_with(|c: char| c.is_ascii_digit()))
                {
                    return None;
                }
                let mut end = start;
                while end < range.end
                    && end - start < max_words
                    && doc.is_word(end)
                    && self.indication_stops.longest_at(doc, end).is_none()
                {
                    end += 1;
                }
                let span = Span::new(start, end);
                (!span.is_empty()).then(|| doc.slice(span).to_string())
            })
    }
}

/// Home and administered cue matches of one document, in document order.
struct OriginCues {
    home: Vec<PhraseMatch>,
    administered: Vec<PhraseMatch>,
}

impl OriginCues {
    /// The cue nearest the mention within its clause; ties go to the cue
    /// before the mention, then to home.
    fn origin(&self, mention: Span, clause: &Range<usize>) -> Origin {
        let home = nearest_cue(&self.home, mention, clause).map(|key| (key, Origin::Home));
        let administered = nearest_cue(&self.administered, mention, clause)
            .map(|key| (key, Origin::Administered));
        home.into_iter()
            .chain(administered)
            .min_by_key(|(key, _)| *key)
            .map_or(Origin::Unspecified, |(_, origin)| origin)
    }
}

/// Distance to the closest cue on either side of `mention`, with `true`
/// marking a cue after it.
fn nearest_cue(
    cues: &[PhraseMatch],
    mention: Span,
    clause: &Range<usize>,
) -> Option<(usize, bool)> {
    let split = cues.partition_point(|c| c.span.end <= mention.start);
    let before = split
        .checked_sub(1)
        .map(|i| cues[i].span)
        .filter(|c| c.start >= clause.start)
        .map(|c| (mention.start - c.end, false));
    let after = cues
        .get(split)
        .map(|c| c.span)
        .filter(|c| c.start >= clause.start && c.end <= clause.end)
        .map(|c| (c.start.saturating_sub(mention.end), true));
    before.into_iter().chain(after).min()
}

impl MedicationParser for MedicationExtractor {
    fn extract_medications(&self, transcript: &str) -> Vec<Medication> {
        self.medications_in(&Document::new(transcript))
    }

    fn extract_allergies(&self, transcript: &str) -> Vec<Allergy> {
        self.allergies_in(&Document::new(transcript))
    }
}

fn flatten<T: Copy>(table: &[medscribe_lexicon::Synonyms<T>]) -> (Vec<&str>, Vec<T>) {
    table
        .iter()
        .flat_map(|s| s.aliases.iter().map(move |a| (a.as_str(), s.value)))
        .unzip()
}

fn is_list_separator(doc: &Document, pos: usize) -> bool {
    doc.tokens().get(pos).is_some_and(|t| {
        t.kind == TokenKind::Comma || LIST_SEPARATORS.contains(&t.text.as_str())
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> MedicationExtractor {
        MedicationExtractor::new(Arc::new(Lexicon::builtin().unwrap()))
    }

    fn meds(text: &str) -> Vec<Medication> {
        parser().extract_medications(text)
    }

    // ── Dosing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_full_dosing_with_longform_synonyms() {
        let found = meds("Lisinopril 10 milligrams by mouth once daily for high blood pressure");
        assert_eq!(found.len(), 1);
        let med = &found[0];
        assert_eq!(med.name, "Lisinopril");
        assert_eq!(med.dose.as_deref(), Some("10"));
        assert_eq!(med.unit, Some(DoseUnit::Mg));
        assert_eq!(med.route, Some(Route::Po));
        assert_eq!(med.frequency, Some(Frequency::Daily));
        assert_eq!(med.indication.as_deref(), Some("high blood pressure"));
    }

    #[test]
    fn test_attached_unit_and_abbreviations() {
        let med = &meds("Metoprolol 25mg p.o. b.i.d.")[0];
        assert_eq!(med.dose.as_deref(), Some("25"));
        assert_eq!(med.unit, Some(DoseUnit::Mg));
        assert_eq!(med.route, Some(Route::Po));
        assert_eq!(med.frequency, Some(Frequency::Bid));
    }

    #[test]
    fn test_dose_before_drug_name() {
        let med = &meds("We gave 4 mg of morphine IV.")[0];
        assert_eq!(med.name, "Morphine");
        assert_eq!(med.dose.as_deref(), Some("4"));
        assert_eq!(med.unit, Some(DoseUnit::Mg));
        assert_eq!(med.route, Some(Route::Iv));
        assert_eq!(med.origin, Origin::Administered);
    }

    #[test]
    fn test_dose_does_not_leak_across_list_items() {
        let found = meds("Lisinopril 10 mg and metoprolol.");
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].name, "Metoprolol");
        assert_eq!(found[1].dose, None);
    }

    #[test]
    fn test_partial_record_kept() {
        let found = meds("She uses Tylenol sometimes.");
        assert_eq!(found, vec![Medication::named("Acetaminophen")]);
    }

    #[test]
    fn test_duration_is_not_an_indication() {
        let med = &meds("Has been on aspirin for years.")[0];
        assert_eq!(med.indication, None);
        let med = &meds("Aspirin 81 mg for 3 weeks.")[0];
        assert_eq!(med.indication, None);
    }

    // ── Names ────────────────────────────────────────────────────────────────

    #[test]
    fn test_brand_names_canonicalized() {
        let names: Vec<String> = meds("Takes Zestril, Advil and Lantus 20 units at bedtime.")
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Lisinopril", "Ibuprofen", "Insulin glargine"]);
    }

    #[test]
    fn test_longest_alias_wins() {
        let found = meds("Lantus 20 units at bedtime, insulin glargine.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].unit, Some(DoseUnit::Units));
        assert_eq!(found[0].frequency, Some(Frequency::Qhs));
    }

    #[test]
    fn test_mentions_merge_first_value_wins() {
        let found = meds("Lisinopril 10 mg daily. She takes lisinopril 20 mg at home by mouth.");
        assert_eq!(found.len(), 1);
        let med = &found[0];
        assert_eq!(med.dose.as_deref(), Some("10"));
        assert_eq!(med.frequency, Some(Frequency::Daily));
        assert_eq!(med.route, Some(Route::Po));
        assert_eq!(med.origin, Origin::Home);
    }

    // ── Origin ───────────────────────────────────────────────────────────────

    #[test]
    fn test_nearest_cue_decides_origin() {
        let found = meds("Takes metoprolol at home, we gave aspirin in the ED.");
        assert_eq!(found[0].name, "Metoprolol");
        assert_eq!(found[0].origin, Origin::Home);
        assert_eq!(found[1].name, "Aspirin");
        assert_eq!(found[1].origin, Origin::Administered);
    }

    #[test]
    fn test_origin_defaults_to_unspecified() {
        assert_eq!(meds("Aspirin 81 mg.")[0].origin, Origin::Unspecified);
    }

    // ── Allergy clauses ──────────────────────────────────────────────────────

    #[test]
    fn test_allergy_clause_is_not_a_medication() {
        let parser = parser();
        let text = "Allergic to penicillin, causes hives. Takes amoxicillin? No.";
        let names: Vec<String> = parser
            .extract_medications(text)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert!(!names.contains(&"Penicillin".to_string()));
        let allergies = parser.extract_allergies(text);
        assert_eq!(allergies.len(), 1);
        assert_eq!(allergies[0].allergen, "penicillin");
    }

    #[test]
    fn test_no_known_allergies_keeps_medications() {
        let found = meds("She takes lisinopril 10 mg daily and has no known allergies.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Lisinopril");
        assert_eq!(found[0].dose.as_deref(), Some("10"));
    }

    #[test]
    fn test_drug_beside_allergy_talk_is_kept() {
        let parser = parser();
        let text = "Allergic to sulfa, takes metformin 500 mg twice daily.";
        let names: Vec<String> =
            parser.extract_medications(text).into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Metformin"]);
        assert_eq!(parser.extract_allergies(text)[0].allergen, "sulfa");
    }

    // ── Negation ─────────────────────────────────────────────────────────────

    #[test]
    fn test_denied_medication_dropped() {
        assert!(meds("Patient is not taking warfarin. Denies any blood thinners.").is_empty());
        assert!(meds("Has never been on insulin.").is_empty());
    }

    #[test]
    fn test_denial_does_not_cross_into_new_medication_item() {
        let found = meds("Denies chest pain, takes aspirin 81 mg daily.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Aspirin");
    }
}
