//! Error types for the medscribe pipeline.
//!
//! Analysis and rendering never fail: a sparse transcript produces a sparse
//! encounter, not an error. The only fallible operations are loading
//! configuration (lexicons, rule banks, pipeline config) and parsing
//! caller-supplied names such as note formats.

use thiserror::Error;

/// The unified error type for medscribe crates.
#[derive(Debug, Error)]
pub enum MedscribeError {
    /// A configuration document is missing, unreadable, or malformed.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A red-flag rule-set parsed but failed validation.
    #[error("invalid rule-set '{rule_set}': {reason}")]
    InvalidRuleSet { rule_set: String, reason: String },

    /// A note format name did not match any supported format.
    #[error("unknown note format '{format}'")]
    UnknownNoteFormat { format: String },
}

/// Convenience alias used throughout the medscribe crates.
pub type MedscribeResult<T> = Result<T, MedscribeError>;
