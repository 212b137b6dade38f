//! # medscribe-rules
//!
//! A TOML-declared red-flag rule bank and its single generic evaluator.
//!
//! ## Overview
//!
//! This crate provides [`TomlRedFlagDetector`], which implements the
//! [`RedFlagDetector`](medscribe_core::traits::RedFlagDetector) trait. Each
//! screened condition is one rule-set: a severity, a recommendation, and a
//! list of weighted findings. No condition has code of its own.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use medscribe_lexicon::Lexicon;
//! use medscribe_rules::TomlRedFlagDetector;
//!
//! let lexicon = Lexicon::builtin()?;
//! let detector = TomlRedFlagDetector::builtin(&lexicon.negation)?;
//! // Pass `detector` to `medscribe_core::Analyzer::new(...)`.
//! ```
//!
//! ## Scoring
//!
//! Confidence is the matched share of a rule-set's total weight. A rule-set
//! fires when it matched at least `thresholds.min_findings` findings and
//! its confidence is at least `thresholds.min_confidence`.

pub mod engine;
pub mod rule;

pub use engine::{TomlRedFlagDetector, BUILTIN_RULES};
pub use rule::{Finding, Predicate, RuleBank, RuleSet, Thresholds};

// ── Tests ─────────────────────────────────────────────────────────────────────
