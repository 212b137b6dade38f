//! # medscribe-note
//!
//! Deterministic clinical note assembly.
//!
//! [`NoteAssembler`] implements
//! [`NoteRenderer`](medscribe_core::traits::NoteRenderer) for the five
//! [`NoteFormat`](medscribe_contracts::note::NoteFormat)s. Notes are plain
//! text; a red-flag block leads the note whenever an alert fired, and every
//! empty section shows `Not discussed` instead of disappearing.
//!
//! ```rust,ignore
//! use medscribe_note::NoteAssembler;
//! use medscribe_core::traits::NoteRenderer;
//!
//! let note = NoteAssembler::new().render(&encounter, &meds, &allergies, &flags, NoteFormat::Soap);
//! ```

pub mod assembler;
pub mod sections;

pub use assembler::{render_note, NoteAssembler, NoteInput};

// ── Tests ─────────────────────────────────────────────────────────────────────
