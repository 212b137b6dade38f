//! # medscribe-extract
//!
//! Rule-based extraction over a normalized transcript.
//!
//! This crate provides:
//! - `text`: normalization, tokenization and whole-word phrase matching
//! - `negation`: the negation scope resolver every other extractor consults
//! - `entities`: the `EncounterExtractor` implementation
//! - `vitals`: vital sign capture and plausibility checks
//! - `medications` / `allergies`: the `MedicationParser` implementation
//!
//! All extractors borrow a shared, immutable `Lexicon` and keep no state
//! between calls.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medscribe_extract::{EntityExtractor, MedicationExtractor};
//! use medscribe_lexicon::Lexicon;
//!
//! let lexicon = Arc::new(Lexicon::builtin()?);
//! let entities = EntityExtractor::new(lexicon.clone());
//! let medications = MedicationExtractor::new(lexicon);
//! ```

pub mod allergies;
pub mod entities;
pub mod medications;
pub mod negation;
pub mod text;
pub mod vitals;

pub use allergies::AllergyExtractor;
pub use entities::EntityExtractor;
pub use medications::MedicationExtractor;
pub use negation::{resolve, NegationResolver, Resolution};
pub use text::{normalize, Document, PhraseSet};
pub use vitals::{extract_vitals, validate, validate_blood_pressure};
