//! # medscribe-contracts
//!
//! Shared types for the medscribe transcript-analysis pipeline.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate beyond data definitions, ordering helpers and error types.

pub mod alert;
pub mod analysis;
pub mod diagnostic;
pub mod encounter;
pub mod error;
pub mod medication;
pub mod negation;
pub mod note;
pub mod vitals;
