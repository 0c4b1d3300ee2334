//! Error types for the misp-objects extraction library.
//!
//! This module provides structured error handling using thiserror. Every
//! variant aborts the extraction that produced it; the only non-fatal
//! condition (a missing fuzzy-hashing capability) is logged, not raised.

use thiserror::Error;

/// Main error type for object construction and extraction.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// Extractor input was unusable (e.g. an empty byte buffer)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Template name unknown to the schema provider
    #[error("Unknown object template: {0}")]
    SchemaNotFound(String),

    /// Attribute relation not declared by the object's template
    #[error("Template '{template}' does not declare attribute relation '{relation}'")]
    UnknownAttribute { template: String, relation: String },

    /// Single-valued relation added a second time
    #[error("Attribute relation '{relation}' is single-valued in template '{template}' and already set")]
    DuplicateAttribute { template: String, relation: String },

    /// Attribute value does not satisfy the declared type
    #[error("Attribute '{relation}' expects {expected}, got {got}")]
    TypeMismatch {
        relation: String,
        expected: &'static str,
        got: String,
    },

    /// Binary parser failure (malformed input)
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O errors (path input form)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors during export
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for object operations
pub type Result<T> = std::result::Result<T, ObjectError>;
