//! # medscribe-core
//!
//! The deterministic analysis pipeline for clinical transcripts.
//!
//! This crate provides:
//! - The four component traits (`EncounterExtractor`, `MedicationParser`,
//!   `RedFlagDetector`, `NoteRenderer`)
//! - The `Analyzer` that wires them together in pipeline order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medscribe_core::{Analyzer, traits::{EncounterExtractor, RedFlagDetector}};
//! ```

pub mod analyzer;
pub mod traits;

pub use analyzer::{diagnose, Analyzer};
