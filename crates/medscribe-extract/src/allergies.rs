//! Allergy capture.
//!
//! Allergens come from two places: the list following an allergy trigger
//! ("allergic to penicillin and sulfa"), and known allergens named anywhere
//! in a clause that talks about allergies. A "no known allergies" statement
//! does not make its clause talk about allergies. Reaction and severity are
//! looked up near each allergen.

use std::collections::HashSet;
use std::ops::Range;

use tracing::debug;

use medscribe_contracts::medication::{Allergy, AllergySeverity};
use medscribe_lexicon::AllergyLexicon;

use crate::negation::NegationResolver;
use crate::text::{Document, PhraseSet, Span, TokenKind};

/// Longest allergen item captured from a trigger list.
const MAX_ITEM_WORDS: usize = 3;

/// Words separating allergen items in a list.
const ITEM_CONNECTORS: [&str; 2] = ["and", "or"];

/// An allergen mention, before reaction lookup.
#[derive(Debug, Clone)]
struct Candidate {
    allergen: String,
    span: Span,
}

/// Compiled allergy vocabulary.
#[derive(Debug, Clone)]
pub struct AllergyExtractor {
    negation: NegationResolver,
    triggers: PhraseSet,
    context: PhraseSet,
    no_known: PhraseSet,
    allergens: PhraseSet,
    reactions: PhraseSet,
    reaction_names: Vec<String>,
    stops: PhraseSet,
    determiners: PhraseSet,
    severity: Vec<(AllergySeverity, PhraseSet)>,
}

impl AllergyExtractor {
    pub fn new(lexicon: &AllergyLexicon, negation: NegationResolver) -> Self {
        Self {
            negation,
            triggers: PhraseSet::new(&lexicon.triggers),
            context: PhraseSet::new(&lexicon.context_words),
            no_known: PhraseSet::new(&lexicon.no_known),
            allergens: PhraseSet::new(&lexicon.allergens),
            reactions: PhraseSet::new(&lexicon.reactions),
            reaction_names: lexicon.reactions.clone(),
            stops: PhraseSet::new(&lexicon.list_stop_words),
            determiners: PhraseSet::new(&lexicon.determiners),
            severity: lexicon
                .severity
                .iter()
                .map(|tier| (tier.value, PhraseSet::new(&tier.aliases)))
                .collect(),
        }
    }

    /// Token spans of every allergen mention, in document order.
    pub fn allergen_spans(&self, doc: &Document) -> Vec<Span> {
        self.candidates(doc).into_iter().map(|c| c.span).collect()
    }

    pub fn extract(&self, doc: &Document) -> Vec<Allergy> {
        let candidates = self.candidates(doc);

        let mut seen: HashSet<&str> = HashSet::new();
        let mut allergies: Vec<Allergy> = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            if !seen.insert(candidate.allergen.as_str()) {
                continue;
            }
            // An allergen's segment runs up to the next allergen in its clause.
            let clause = doc.clause_bounds(candidate.span.start);
            let segment_end = candidates
                .get(i + 1)
                .map(|next| next.span.start)
                .filter(|start| clause.contains(start))
                .unwrap_or(clause.end);
            let range =
                self.reaction_range(doc, candidate, candidate.span.start..segment_end, &candidates);
            allergies.push(Allergy {
                allergen: candidate.allergen.clone(),
                reaction: self.reaction(doc, range.clone(), candidate.span),
                severity: self.severity(doc, range),
            });
        }
        debug!(count = allergies.len(), "allergies extracted");
        allergies
    }

    // ── Candidates ───────────────────────────────────────────────────────────

    fn candidates(&self, doc: &Document) -> Vec<Candidate> {
        let mut candidates = self.from_triggers(doc);
        self.add_known_allergens(doc, &mut candidates);
        candidates.sort_by_key(|c| c.span.start);
        candidates
    }

    /// Start of every clause that talks about allergies, ascending. Context
    /// words inside a "no known allergies" statement do not count.
    fn allergy_clauses(&self, doc: &Document) -> Vec<usize> {
        let denials = self.no_known.find_all(doc);
        let mut starts: Vec<usize> = self
            .context
            .find_all(doc)
            .into_iter()
            .filter(|m| !denials.iter().any(|d| d.span.overlaps(m.span)))
            .map(|m| doc.clause_bounds(m.span.start).start)
            .collect();
        starts.dedup();
        starts
    }

    /// Items of the list after each non-negated trigger.
    fn from_triggers(&self, doc: &Document) -> Vec<Candidate> {
        let mut found = Vec::new();
        for trigger in self.triggers.find_all(doc) {
            if self.negation.span_polarity(doc, trigger.span).is_denied() {
                continue;
            }
            let clause_end = doc.clause_bounds(trigger.span.start).end;
            let mut items: Vec<Span> = Vec::new();
            let mut pos = trigger.span.end;

            loop {
                while let Some((_, end)) = self.determiners.longest_at(doc, pos) {
                    pos = end;
                }
                let start = pos;
                if let Some(end) = self.descriptor_at(doc, pos) {
                    // A reaction or severity in list position is not an allergen.
                    pos = end.min(clause_end);
                } else {
                    while pos < clause_end
                        && doc.is_word(pos)
                        && !is_connector(doc, pos)
                        && self.stops.longest_at(doc, pos).is_none()
                        && self.descriptor_at(doc, pos).is_none()
                    {
                        pos += 1;
                    }
                    let item = Span::new(start, pos.min(start + MAX_ITEM_WORDS));
                    if !item.is_empty() {
                        items.push(item);
                    }
                }

                // Only commas and connectors continue the list.
                let mut advanced = false;
                while pos < clause_end
                    && (doc.tokens()[pos].kind == TokenKind::Comma || is_connector(doc, pos))
                {
                    pos += 1;
                    advanced = true;
                }
                if !advanced || pos >= clause_end {
                    break;
                }
            }

            found.extend(items.into_iter().map(|item| Candidate {
                allergen: doc.slice(item).to_string(),
                span: item,
            }));
        }
        found
    }

    /// End of the reaction or severity word starting at `pos`.
    fn descriptor_at(&self, doc: &Document, pos: usize) -> Option<usize> {
        self.reactions
            .longest_at(doc, pos)
            .or_else(|| self.severity.iter().find_map(|(_, words)| words.longest_at(doc, pos)))
            .map(|(_, end)| end)
    }

    /// Known allergens in allergy-talk clauses not already captured.
    fn add_known_allergens(&self, doc: &Document, candidates: &mut Vec<Candidate>) {
        let clauses = self.allergy_clauses(doc);
        for m in self.allergens.find_all(doc) {
            if candidates.iter().any(|c| c.span.overlaps(m.span)) {
                continue;
            }
            let clause = doc.clause_bounds(m.span.start).start;
            if clauses.binary_search(&clause).is_err()
                || self.negation.span_polarity(doc, m.span).is_denied()
            {
                continue;
            }
            candidates.push(Candidate {
                allergen: doc.slice(m.span).to_string(),
                span: m.span,
            });
        }
    }

    // ── Reaction and severity ────────────────────────────────────────────────

    /// The allergen's own segment, widened to its clause when the segment
    /// names no reaction and the clause has no other allergen.
    fn reaction_range(
        &self,
        doc: &Document,
        candidate: &Candidate,
        segment: Range<usize>,
        all: &[Candidate],
    ) -> Range<usize> {
        if self.reactions.occurs_in(doc, segment.clone()) {
            return segment;
        }
        let clause = doc.clause_bounds(candidate.span.start);
        let first = all.partition_point(|c| c.span.start < clause.start);
        let last = all.partition_point(|c| c.span.start < clause.end);
        let alone = all[first..last]
            .iter()
            .all(|c| c.allergen == candidate.allergen);
        if alone {
            clause
        } else {
            segment
        }
    }

    fn reaction(&self, doc: &Document, range: Range<usize>, allergen: Span) -> Option<String> {
        self.reactions
            .find_in(doc, range)
            .into_iter()
            .find(|m| !m.span.overlaps(allergen))
            .map(|m| self.reaction_names[m.phrase].clone())
    }

    fn severity(&self, doc: &Document, range: Range<usize>) -> Option<AllergySeverity> {
        self.severity
            .iter()
            .find(|(_, words)| words.occurs_in(doc, range.clone()))
            .map(|(tier, _)| *tier)
    }
}

fn is_connector(doc: &Document, pos: usize) -> bool {
    doc.tokens()
        .get(pos)
        .is_some_and(|t| ITEM_CONNECTORS.contains(&t.text.as_str()))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use medscribe_lexicon::Lexicon;

    use super::*;

    fn extract(text: &str) -> Vec<Allergy> {
        let lexicon = Lexicon::builtin().unwrap();
        let extractor =
            AllergyExtractor::new(&lexicon.allergies, NegationResolver::new(&lexicon.negation));
        extractor.extract(&Document::new(text))
    }

    fn names(allergies: &[Allergy]) -> Vec<&str> {
        allergies.iter().map(|a| a.allergen.as_str()).collect()
    }

    // ── Lists ────────────────────────────────────────────────────────────────

    #[test]
    fn test_coordinated_list_after_trigger() {
        let allergies = extract("She is allergic to penicillin and sulfa.");
        assert_eq!(names(&allergies), vec!["penicillin", "sulfa"]);
        assert!(allergies.iter().all(|a| a.reaction.is_none() && a.severity.is_none()));
    }

    #[test]
    fn test_comma_list_with_unknown_allergen() {
        let allergies = extract("Allergies include codeine, strawberries, and latex.");
        assert_eq!(names(&allergies), vec!["codeine", "strawberries", "latex"]);
    }

    #[test]
    fn test_determiners_stripped() {
        let allergies = extract("Allergic to all the shellfish.");
        assert_eq!(names(&allergies), vec!["shellfish"]);
    }

    // ── Reactions ────────────────────────────────────────────────────────────

    #[test]
    fn test_reaction_after_stop_word() {
        let allergies = extract("Allergic to penicillin, causes hives.");
        assert_eq!(allergies.len(), 1);
        assert_eq!(allergies[0].reaction.as_deref(), Some("hives"));
        assert_eq!(allergies[0].severity, Some(AllergySeverity::Moderate));
    }

    #[test]
    fn test_reaction_item_is_not_an_allergen() {
        let allergies = extract("Allergic to peanuts, anaphylaxis.");
        assert_eq!(names(&allergies), vec!["peanuts"]);
        assert_eq!(allergies[0].reaction.as_deref(), Some("anaphylaxis"));
        assert_eq!(allergies[0].severity, Some(AllergySeverity::Anaphylaxis));
    }

    #[test]
    fn test_reaction_stays_with_its_allergen() {
        let allergies = extract("Allergic to sulfa with a rash, and codeine which causes nausea.");
        assert_eq!(names(&allergies), vec!["sulfa", "codeine"]);
        assert_eq!(allergies[0].reaction.as_deref(), Some("rash"));
        assert_eq!(allergies[0].severity, Some(AllergySeverity::Mild));
        assert_eq!(allergies[1].reaction.as_deref(), Some("nausea"));
    }

    #[test]
    fn test_most_severe_tier_wins() {
        let allergies = extract("Allergic to latex, throat swelling and hives.");
        assert_eq!(allergies[0].severity, Some(AllergySeverity::Anaphylaxis));
    }

    // ── Context matches ──────────────────────────────────────────────────────

    #[test]
    fn test_known_allergen_in_allergy_clause() {
        let allergies = extract("Penicillin gave her a rash, that is her only allergy.");
        assert_eq!(names(&allergies), vec!["penicillin"]);
        assert_eq!(allergies[0].reaction.as_deref(), Some("rash"));
    }

    #[test]
    fn test_known_allergen_outside_allergy_clause_ignored() {
        assert!(extract("Took aspirin this morning.").is_empty());
    }

    #[test]
    fn test_negated_allergy_ignored() {
        assert!(extract("Not allergic to penicillin.").is_empty());
        assert!(extract("No known drug allergies.").is_empty());
    }

    #[test]
    fn test_repeated_allergen_reported_once() {
        let allergies = extract("Allergic to penicillin. Again, the penicillin allergy is mild.");
        assert_eq!(names(&allergies), vec!["penicillin"]);
    }

    #[test]
    fn test_severity_word_is_not_an_allergen() {
        let allergies = extract("Her sulfa allergy is severe.");
        assert_eq!(names(&allergies), vec!["sulfa"]);
        assert_eq!(allergies[0].severity, Some(AllergySeverity::Severe));

        let allergies = extract("Allergic to latex, mild, and codeine.");
        assert_eq!(names(&allergies), vec!["latex", "codeine"]);
    }

    #[test]
    fn test_no_known_allergies_is_not_allergy_talk() {
        assert!(extract("She takes aspirin daily and has no known allergies.").is_empty());
    }
}
