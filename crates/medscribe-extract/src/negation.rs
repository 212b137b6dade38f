//! Negation scope resolution.
//!
//! Each occurrence of a term is classified on its own:
//!
//! 1. A question right after the term ("chest pain? no") is settled by the
//!    first answer word.
//! 2. A post-cue shortly after the term ("pneumonia ruled out") denies it.
//! 3. Otherwise the preceding window is searched for the nearest cue. The
//!    window counts words back from the term; its budget resets at commas and
//!    list connectors so that one cue covers a whole coordinated list, and it
//!    stops at scope terminators, clause ends, and after `MAX_LIST_ITEMS`
//!    list items. A cue that is part of a
//!    pseudo-negation ("no change") is skipped, and an affirming marker between
//!    the cue and the term cancels it.
//!
//! A term with several occurrences takes the polarity of its last one.

use tracing::trace;

use medscribe_contracts::negation::Polarity;
use medscribe_lexicon::NegationLexicon;

use crate::text::{Document, PhraseSet, Span, TokenKind};

/// How many tokens before a cue a covering pseudo-cue may start.
const PSEUDO_LOOKBEHIND: usize = 3;

/// Most list items one cue can reach across, in either direction.
const MAX_LIST_ITEMS: usize = 12;

/// The polarity of one occurrence of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub span: Span,
    pub polarity: Polarity,
}

/// Every occurrence of a term (or any of its aliases), in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub occurrences: Vec<Occurrence>,
}

impl Resolution {
    /// Last mention wins; `Unknown` when the term never occurs.
    pub fn polarity(&self) -> Polarity {
        self.occurrences
            .last()
            .map_or(Polarity::Unknown, |o| o.polarity)
    }

    /// True when the term is both affirmed and denied somewhere.
    pub fn is_conflicting(&self) -> bool {
        self.occurrences.iter().any(|o| o.polarity.is_present())
            && self.occurrences.iter().any(|o| o.polarity.is_denied())
    }

    pub fn first_present(&self) -> Option<Span> {
        self.occurrences
            .iter()
            .find(|o| o.polarity.is_present())
            .map(|o| o.span)
    }
}

/// A `NegationLexicon` compiled for matching.
#[derive(Debug, Clone)]
pub struct NegationResolver {
    window: usize,
    trailing_window: usize,
    cues: PhraseSet,
    cue_words: Vec<String>,
    pseudo_cues: PhraseSet,
    post_cues: PhraseSet,
    post_cue_words: Vec<String>,
    affirmations: PhraseSet,
    scope_terminators: PhraseSet,
    list_connectors: PhraseSet,
    denial_answers: PhraseSet,
    affirm_answers: PhraseSet,
}

impl NegationResolver {
    pub fn new(lexicon: &NegationLexicon) -> Self {
        Self {
            window: lexicon.window,
            trailing_window: lexicon.trailing_window,
            cues: PhraseSet::new(&lexicon.cues),
            cue_words: lexicon.cues.clone(),
            pseudo_cues: PhraseSet::new(&lexicon.pseudo_cues),
            post_cues: PhraseSet::new(&lexicon.post_cues),
            post_cue_words: lexicon.post_cues.clone(),
            affirmations: PhraseSet::new(&lexicon.affirmations),
            scope_terminators: PhraseSet::new(&lexicon.scope_terminators),
            list_connectors: PhraseSet::new(&lexicon.list_connectors),
            denial_answers: PhraseSet::new(&lexicon.denial_answers),
            affirm_answers: PhraseSet::new(&lexicon.affirm_answers),
        }
    }

    /// Resolve a single term: last mention wins.
    pub fn resolve(&self, doc: &Document, term: &str) -> Polarity {
        self.resolve_set(doc, &PhraseSet::new(&[term])).polarity()
    }

    /// Resolve every occurrence of any phrase in `aliases`.
    pub fn resolve_set(&self, doc: &Document, aliases: &PhraseSet) -> Resolution {
        let occurrences = aliases
            .find_all(doc)
            .into_iter()
            .map(|m| Occurrence {
                span: m.span,
                polarity: self.span_polarity(doc, m.span),
            })
            .collect();
        Resolution { occurrences }
    }

    /// Classify one occurrence. Never returns `Unknown`.
    pub fn span_polarity(&self, doc: &Document, span: Span) -> Polarity {
        if let Some(polarity) = self.trailing(doc, span) {
            return polarity;
        }
        if self.negated_by_preceding_cue(doc, span) {
            Polarity::Denied
        } else {
            Polarity::Present
        }
    }

    /// Walk forward from the term looking for a question or a post-cue.
    fn trailing(&self, doc: &Document, span: Span) -> Option<Polarity> {
        let tokens = doc.tokens();
        let mut budget = self.trailing_window;
        let mut items = 0;
        let mut pos = span.end;
        while pos < tokens.len() {
            match tokens[pos].kind {
                TokenKind::Terminator => {
                    if tokens[pos].text == "?" {
                        return self.answer_after(doc, pos + 1);
                    }
                    return None;
                }
                TokenKind::Comma => {
                    items += 1;
                    if items > MAX_LIST_ITEMS {
                        return None;
                    }
                    budget = self.trailing_window;
                }
                TokenKind::Symbol => {}
                TokenKind::Word => {
                    if self.list_connectors.longest_at(doc, pos).is_some() {
                        items += 1;
                        if items > MAX_LIST_ITEMS {
                            return None;
                        }
                        budget = self.trailing_window;
                        pos += 1;
                        continue;
                    }
                    if self.scope_terminators.longest_at(doc, pos).is_some() || budget == 0 {
                        return None;
                    }
                    budget -= 1;
                    if let Some((index, end)) = self.post_cues.longest_at(doc, pos) {
                        if !self.reads_as_pre_cue(doc, index, end) {
                            trace!(position = pos, "post-cue in trailing window");
                            return Some(Polarity::Denied);
                        }
                    }
                }
            }
            pos += 1;
        }
        None
    }

    /// A post-cue that is also a pre-cue and runs straight into another word
    /// ("nausea, denied vomiting") belongs to the word after it.
    fn reads_as_pre_cue(&self, doc: &Document, post_index: usize, end: usize) -> bool {
        let phrase = &self.post_cue_words[post_index];
        self.cue_words.iter().any(|c| c == phrase)
            && doc.is_word(end)
            && self.list_connectors.longest_at(doc, end).is_none()
            && self.scope_terminators.longest_at(doc, end).is_none()
    }

    /// The polarity implied by the first word after a question mark.
    fn answer_after(&self, doc: &Document, from: usize) -> Option<Polarity> {
        let pos = (from..doc.len()).find(|&p| doc.is_word(p))?;
        if self.denial_answers.longest_at(doc, pos).is_some() {
            Some(Polarity::Denied)
        } else if self.affirm_answers.longest_at(doc, pos).is_some() {
            Some(Polarity::Present)
        } else {
            None
        }
    }

    fn negated_by_preceding_cue(&self, doc: &Document, span: Span) -> bool {
        let tokens = doc.tokens();
        let clause = doc.clause_bounds(span.start);
        let mut budget = self.window;
        let mut items = 0;
        let mut pos = span.start;

        while pos > clause.start {
            pos -= 1;
            let separator = match tokens[pos].kind {
                TokenKind::Comma => true,
                TokenKind::Terminator => break,
                TokenKind::Symbol => continue,
                TokenKind::Word => self.list_connectors.longest_at(doc, pos).is_some(),
            };
            if separator {
                items += 1;
                if items > MAX_LIST_ITEMS {
                    break;
                }
                budget = self.window;
                continue;
            }
            if budget == 0 {
                break;
            }
            budget -= 1;

            if let Some((_, cue_end)) = self.cues.longest_at(doc, pos) {
                if cue_end > span.start {
                    continue;
                }
                let cue = Span::new(pos, cue_end);
                if self.is_pseudo(doc, cue) {
                    continue;
                }
                // An affirming marker between cue and term cancels the cue.
                if self.affirmations.occurs_in(doc, cue_end..span.start) {
                    return false;
                }
                return true;
            }

            if self.scope_terminators.longest_at(doc, pos).is_some() {
                break;
            }
        }
        false
    }

    fn is_pseudo(&self, doc: &Document, cue: Span) -> bool {
        (cue.start.saturating_sub(PSEUDO_LOOKBEHIND)..=cue.start).any(|start| {
            self.pseudo_cues
                .longest_at(doc, start)
                .is_some_and(|(_, end)| Span::new(start, end).contains(cue))
        })
    }
}

/// Resolve `term` in `text` against `lexicon`.
///
/// Builds a throwaway resolver; callers resolving many terms should build a
/// `NegationResolver` once and reuse it.
pub fn resolve(text: &str, term: &str, lexicon: &NegationLexicon) -> Polarity {
    NegationResolver::new(lexicon).resolve(&Document::new(text), term)
}

// ── Tests ────────────────────────────────────────────────────────────────────
