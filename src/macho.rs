//! Mach-O extractor: drives the object model over a parsed binary.
//!
//! The binary-format parser is a black box behind [`MachoParser`]; this
//! module only maps its reported fields onto the `macho` and
//! `macho-section` templates and wires the `includes` references between
//! the file-level object, the binary object and its section children.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ObjectError, Result};
use crate::hashing;
use crate::object::Object;
use crate::schema::SchemaProvider;
use crate::similarity::FuzzyHasher;

/// One section as reported by the parser.
#[derive(Debug, Clone)]
pub struct MachoSection {
    pub name: String,
    pub size: u64,
    pub entropy: f64,
    pub content: Vec<u8>,
}

/// Parsed representation of a Mach-O binary.
///
/// Sections are kept in the order the parser reported them; the extractor
/// preserves that order in the child list and the reference list.
#[derive(Debug, Clone)]
pub struct MachoBinary {
    /// File-type tag from the header (e.g. "EXECUTE", "DYLIB")
    pub file_type: String,
    pub name: String,
    /// Entry point address, when the binary has one
    pub entrypoint: Option<u64>,
    pub sections: Vec<MachoSection>,
}

/// The three accepted input forms, closed at the boundary.
#[derive(Debug, Clone)]
pub enum MachoInput {
    /// Full binary image in memory
    Bytes(Vec<u8>),
    /// Path to a binary image on disk
    Path(PathBuf),
    /// Already-parsed representation
    Parsed(MachoBinary),
}

impl From<Vec<u8>> for MachoInput {
    fn from(bytes: Vec<u8>) -> Self {
        MachoInput::Bytes(bytes)
    }
}

impl From<PathBuf> for MachoInput {
    fn from(path: PathBuf) -> Self {
        MachoInput::Path(path)
    }
}

impl From<MachoBinary> for MachoInput {
    fn from(parsed: MachoBinary) -> Self {
        MachoInput::Parsed(parsed)
    }
}

/// Black-box binary-format parser.
///
/// A failure here is fatal to the whole extraction; no partial object
/// graph is returned.
pub trait MachoParser {
    fn parse(&self, data: &[u8]) -> Result<MachoBinary>;
}

/// Result of a Mach-O extraction: the binary object plus its section
/// children, in parser order.
#[derive(Debug)]
pub struct MachoObjects {
    pub macho: Object,
    pub sections: Vec<Object>,
}

/// Format-specific adapter from parsed Mach-O fields to the object model.
pub struct MachoExtractor<'a> {
    schema: &'a dyn SchemaProvider,
    parser: &'a dyn MachoParser,
    fuzzy: Option<&'a dyn FuzzyHasher>,
}

impl<'a> MachoExtractor<'a> {
    pub fn new(schema: &'a dyn SchemaProvider, parser: &'a dyn MachoParser) -> Self {
        Self {
            schema,
            parser,
            fuzzy: None,
        }
    }

    /// Inject the optional fuzzy-hashing capability. Without it the
    /// `ssdeep` section attribute is omitted.
    pub fn with_fuzzy_hasher(mut self, fuzzy: &'a dyn FuzzyHasher) -> Self {
        self.fuzzy = Some(fuzzy);
        self
    }

    /// Extract the object graph for one binary.
    ///
    /// `file_object` is the caller's file-level object; on success it
    /// gains exactly one `includes` reference to the new `macho` object
    /// (comment "MachO indicators"). Construction is strictly sequential:
    /// parent first, then each child fully populated in section order, and
    /// `number-sections` set from the final child count.
    pub fn extract(
        &self,
        input: MachoInput,
        file_object: &mut Object,
        standalone: bool,
        default_parameters: Map<String, Value>,
    ) -> Result<MachoObjects> {
        if self.fuzzy.is_none() {
            warn!("fuzzy hashing capability unavailable, ssdeep attributes will be omitted");
        }
        let parsed = self.resolve_input(input)?;

        let mut macho = Object::new(self.schema, "macho", standalone)?
            .with_default_parameters(default_parameters.clone());
        macho.add_attribute("type", parsed.file_type.as_str())?;
        macho.add_attribute("name", parsed.name.as_str())?;
        if let Some(entrypoint) = parsed.entrypoint {
            macho.add_attribute("entrypoint-address", entrypoint)?;
        }

        let mut sections = Vec::with_capacity(parsed.sections.len());
        for (pos, section) in parsed.sections.iter().enumerate() {
            let child = self.section_object(section, standalone, &default_parameters)?;
            macho.add_reference(
                child.uuid(),
                "includes",
                &format!("Section {} of Mach-O", pos),
            );
            sections.push(child);
        }
        macho.add_attribute("number-sections", sections.len())?;

        file_object.add_reference(macho.uuid(), "includes", "MachO indicators");
        debug!(
            name = %parsed.name,
            sections = sections.len(),
            "extracted Mach-O object graph"
        );
        Ok(MachoObjects { macho, sections })
    }

    fn resolve_input(&self, input: MachoInput) -> Result<MachoBinary> {
        match input {
            MachoInput::Bytes(bytes) => {
                if bytes.is_empty() {
                    return Err(ObjectError::InvalidInput("empty byte buffer".to_string()));
                }
                self.parser.parse(&bytes)
            }
            MachoInput::Path(path) => {
                let bytes = std::fs::read(&path)?;
                if bytes.is_empty() {
                    return Err(ObjectError::InvalidInput(format!(
                        "empty file: {}",
                        path.display()
                    )));
                }
                self.parser.parse(&bytes)
            }
            MachoInput::Parsed(parsed) => Ok(parsed),
        }
    }

    /// Build one `macho-section` object.
    ///
    /// Zero-size sections carry exactly `name` and `size-in-bytes`; the
    /// stored size attribute (not the raw record) gates the hashing so the
    /// decision follows the value the object actually exports.
    fn section_object(
        &self,
        section: &MachoSection,
        standalone: bool,
        default_parameters: &Map<String, Value>,
    ) -> Result<Object> {
        let mut obj = Object::new(self.schema, "macho-section", standalone)?
            .with_default_parameters(default_parameters.clone());
        obj.add_attribute("name", section.name.as_str())?;
        let size = obj
            .add_attribute("size-in-bytes", section.size)?
            .value
            .as_i64()
            .unwrap_or(0);
        if size > 0 {
            let data = &section.content;
            obj.add_attribute("entropy", section.entropy)?;
            obj.add_attribute("md5", hashing::md5_digest(data))?;
            obj.add_attribute("sha1", hashing::sha1_digest(data))?;
            obj.add_attribute("sha256", hashing::sha256_digest(data))?;
            obj.add_attribute("sha512", hashing::sha512_digest(data))?;
            if let Some(fuzzy) = self.fuzzy {
                obj.add_attribute("ssdeep", fuzzy.digest(data))?;
            }
        }
        Ok(obj)
    }
}
