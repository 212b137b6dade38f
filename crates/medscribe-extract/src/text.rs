//! Transcript normalization, tokenization and whole-word phrase matching.
//!
//! A `Document` holds the lowercased, whitespace-collapsed transcript and
//! its token stream. Every lexicon phrase is tokenized with the same rules,
//! so matching a phrase is a linear comparison of token texts and never
//! matches inside a word ("no" does not match "know").

use std::ops::Range;

/// Token classes that matter to the matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Letters and digits, with inner `'`, `-`, and decimal points.
    Word,
    /// `,` separates list items without ending the clause.
    Comma,
    /// `.`, `!`, `?` or `;` ending a clause.
    Terminator,
    /// Any other punctuation, including non-terminating periods.
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offsets into the document text.
    pub start: usize,
    pub end: usize,
}

/// A half-open range of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One occurrence of a phrase from a `PhraseSet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseMatch {
    pub span: Span,
    /// Index of the matched phrase in the list the set was built from.
    pub phrase: usize,
}

/// A normalized transcript.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    tokens: Vec<Token>,
    /// Clause bounds for every token index, plus one entry for the end.
    clauses: Vec<Range<usize>>,
}

impl Document {
    pub fn new(raw: &str) -> Self {
        let text = normalize(raw);
        let tokens = tokenize(&text);
        let clauses = clause_index(&tokens);
        Self { text, tokens, clauses }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_word(&self, index: usize) -> bool {
        self.tokens
            .get(index)
            .is_some_and(|t| t.kind == TokenKind::Word)
    }

    /// The token range of the clause containing token `index`. Clauses are
    /// delimited by terminator tokens, which belong to neither side.
    pub fn clause_bounds(&self, index: usize) -> Range<usize> {
        self.clauses[index.min(self.tokens.len())].clone()
    }

    /// The source text covered by `span`, or `""` for an empty span.
    pub fn slice(&self, span: Span) -> &str {
        if span.is_empty() || span.end > self.tokens.len() {
            return "";
        }
        &self.text[self.tokens[span.start].start..self.tokens[span.end - 1].end]
    }

    /// Occurrences of a single phrase, in document order.
    pub fn find_phrase(&self, phrase: &str) -> Vec<Span> {
        PhraseSet::new(&[phrase])
            .find_all(self)
            .into_iter()
            .map(|m| m.span)
            .collect()
    }
}

/// A list of phrases, pre-tokenized for matching against documents.
#[derive(Debug, Clone, Default)]
pub struct PhraseSet {
    phrases: Vec<Vec<String>>,
}

impl PhraseSet {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Self {
        let phrases = phrases
            .iter()
            .map(|p| {
                tokenize(&normalize(p.as_ref()))
                    .into_iter()
                    .map(|t| t.text)
                    .collect()
            })
            .collect();
        Self { phrases }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// The longest phrase starting at token `pos`, as `(phrase index, end)`.
    /// Ties go to the phrase listed first.
    pub fn longest_at(&self, doc: &Document, pos: usize) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (index, phrase) in self.phrases.iter().enumerate() {
            if phrase.is_empty() || !matches_at(doc, pos, phrase) {
                continue;
            }
            let end = pos + phrase.len();
            if best.map_or(true, |(_, e)| end > e) {
                best = Some((index, end));
            }
        }
        best
    }

    /// Non-overlapping occurrences within `range`, leftmost-longest.
    pub fn find_in(&self, doc: &Document, range: Range<usize>) -> Vec<PhraseMatch> {
        let end = range.end.min(doc.len());
        let mut found = Vec::new();
        let mut pos = range.start;
        while pos < end {
            match self.longest_at(doc, pos) {
                Some((phrase, stop)) if stop <= end => {
                    found.push(PhraseMatch { span: Span::new(pos, stop), phrase });
                    pos = stop;
                }
                _ => pos += 1,
            }
        }
        found
    }

    pub fn find_all(&self, doc: &Document) -> Vec<PhraseMatch> {
        self.find_in(doc, 0..doc.len())
    }

    pub fn first_in(&self, doc: &Document, range: Range<usize>) -> Option<PhraseMatch> {
        self.find_in(doc, range).into_iter().next()
    }

    pub fn occurs_in(&self, doc: &Document, range: Range<usize>) -> bool {
        self.first_in(doc, range).is_some()
    }
}

fn matches_at(doc: &Document, pos: usize, phrase: &[String]) -> bool {
    let tokens = doc.tokens();
    pos + phrase.len() <= tokens.len()
        && phrase
            .iter()
            .zip(&tokens[pos..])
            .all(|(want, token)| *want == token.text)
}

/// Clause bounds per token index. A terminator maps to the clause it ends;
/// the extra final entry maps to the trailing clause.
fn clause_index(tokens: &[Token]) -> Vec<Range<usize>> {
    let mut clauses = Vec::with_capacity(tokens.len() + 1);
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Terminator {
            clauses.resize(i + 1, start..i);
            start = i + 1;
        }
    }
    clauses.resize(tokens.len() + 1, start..tokens.len());
    clauses
}

/// Lowercase, fold typographic apostrophes, and collapse whitespace.
pub fn normalize(raw: &str) -> String {
    raw.replace(['\u{2019}', '\u{2018}'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Split normalized text into tokens.
///
/// A `.` terminates a clause only when followed by whitespace or the end of
/// text and not preceded by a single letter, so `p.o.` and `b.i.d.` stay
/// inside their clause. Decimal points inside numbers belong to the word.
pub fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_end = |i: usize| chars.get(i).map_or(text.len(), |&(b, _)| b);
    let is_alnum = |i: usize| chars.get(i).is_some_and(|&(_, c)| c.is_alphanumeric());
    let is_digit = |i: usize| chars.get(i).is_some_and(|&(_, c)| c.is_ascii_digit());

    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (start, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_alphanumeric() {
            let mut j = i + 1;
            while j < chars.len() {
                let cj = chars[j].1;
                let joins = cj.is_alphanumeric()
                    || ((cj == '\'' || cj == '-') && is_alnum(j + 1))
                    || (cj == '.' && is_digit(j - 1) && is_digit(j + 1));
                if !joins {
                    break;
                }
                j += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Word,
                text: text[start..byte_end(j)].to_string(),
                start,
                end: byte_end(j),
            });
            i = j;
            continue;
        }

        let kind = match c {
            ',' => TokenKind::Comma,
            '!' | '?' | ';' => TokenKind::Terminator,
            '.' => {
                let at_boundary = chars.get(i + 1).map_or(true, |&(_, n)| n.is_whitespace());
                let after_initial = tokens.last().is_some_and(|t| {
                    t.kind == TokenKind::Word
                        && t.end == start
                        && t.text.chars().count() == 1
                        && t.text.chars().all(char::is_alphabetic)
                });
                if at_boundary && !after_initial {
                    TokenKind::Terminator
                } else {
                    TokenKind::Symbol
                }
            }
            _ => TokenKind::Symbol,
        };
        tokens.push(Token {
            kind,
            text: c.to_string(),
            start,
            end: start + c.len_utf8(),
        });
        i += 1;
    }
    tokens
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, String)> {
        tokenize(text).into_iter().map(|t| (t.kind, t.text)).collect()
    }

    // ── Tokenizer ────────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_collapses_and_lowercases() {
        assert_eq!(normalize("  Patient   DENIES\n\tpain "), "patient denies pain");
        assert_eq!(normalize("doesn\u{2019}t"), "doesn't");
    }

    #[test]
    fn test_words_keep_inner_punctuation() {
        let texts: Vec<String> = tokenize("doesn't light-headed 98.6 10mg")
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["doesn't", "light-headed", "98.6", "10mg"]);
    }

    #[test]
    fn test_abbreviation_periods_do_not_end_clauses() {
        let tokens = kinds("take 1 tab p.o. b.i.d. daily.");
        let terminators: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, (k, _))| *k == TokenKind::Terminator)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(terminators, vec![tokens.len() - 1]);
    }

    #[test]
    fn test_clause_punctuation() {
        let tokens = kinds("no pain, no fever? yes; ok");
        assert_eq!(tokens[2].0, TokenKind::Comma);
        assert_eq!(tokens[5].0, TokenKind::Terminator);
        assert_eq!(tokens[7].0, TokenKind::Terminator);
    }

    // ── Matching ─────────────────────────────────────────────────────────────

    #[test]
    fn test_find_phrase_is_whole_word() {
        let doc = Document::new("I know there is no pain");
        let spans = doc.find_phrase("no");
        assert_eq!(spans, vec![Span::new(4, 5)]);
    }

    #[test]
    fn test_longest_phrase_wins_at_same_start() {
        let doc = Document::new("on insulin glargine nightly");
        let set = PhraseSet::new(&["insulin", "insulin glargine"]);
        let found = set.find_all(&doc);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].phrase, 1);
        assert_eq!(doc.slice(found[0].span), "insulin glargine");
    }

    #[test]
    fn test_phrases_with_symbols_match() {
        let doc = Document::new("Tylenol 500 mg P.O. q6h");
        let found = PhraseSet::new(&["p.o."]).find_all(&doc);
        assert_eq!(found.len(), 1);
        assert_eq!(doc.slice(found[0].span), "p.o.");
    }

    #[test]
    fn test_clause_bounds_and_slice() {
        let doc = Document::new("Chest pain today. Denies fever, chills.");
        let fever = doc.find_phrase("fever")[0];
        let clause = doc.clause_bounds(fever.start);
        assert_eq!(
            doc.slice(Span::new(clause.start, clause.end)),
            "denies fever, chills"
        );
        assert_eq!(doc.slice(Span::new(3, 3)), "");
    }

    #[test]
    fn test_clause_bounds_at_terminators_and_end() {
        let doc = Document::new("no pain. fever");
        assert_eq!(doc.clause_bounds(0), 0..2);
        // The terminator closes the clause before it.
        assert_eq!(doc.clause_bounds(2), 0..2);
        assert_eq!(doc.clause_bounds(3), 3..4);
        assert_eq!(doc.clause_bounds(4), 3..4);
        assert_eq!(doc.clause_bounds(99), 3..4);
        assert_eq!(Document::new("").clause_bounds(0), 0..0);
    }
}
