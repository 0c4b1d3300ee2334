//! MISP-style object graphs for binary threat intelligence.
//!
//! This crate builds typed, schema-validated indicator objects from
//! parsed binary representations. The object model ([`object`]) is
//! format-agnostic: objects are bound to templates served by a
//! [`schema::SchemaProvider`], carry ordered attributes and typed
//! references, and export in the indicator-exchange platform's envelope.
//! The [`macho`] module is the format-specific adapter that maps a parsed
//! Mach-O binary onto that model, one parent object plus one child per
//! section, hashed and measured individually.

/// Error taxonomy shared by the object model and extractors
pub mod error;
/// Cryptographic digest helpers
pub mod hashing;
/// Tracing setup
pub mod logging;
/// Mach-O extractor
pub mod macho;
/// Object/attribute/reference model
pub mod object;
/// Templates and the schema provider seam
pub mod schema;
/// Optional fuzzy-hashing capability
pub mod similarity;

pub use error::{ObjectError, Result};
pub use macho::{MachoBinary, MachoExtractor, MachoInput, MachoObjects, MachoParser, MachoSection};
pub use object::{Attribute, AttributeValue, Object, Reference};
pub use schema::{AttributeType, BuiltinSchemas, SchemaProvider, Template};
pub use similarity::{Ctph, FuzzyHasher};
