//! Object templates and the schema provider interface.
//!
//! Every [`Object`](crate::object::Object) is bound to a named template
//! that declares which attribute relations it may carry and what value
//! type each relation takes. Templates are served by a [`SchemaProvider`],
//! kept as an explicit seam so deployments can load their own template
//! sets without touching the object model.

use std::collections::HashMap;
use std::fmt;

use crate::error::ObjectError;
use crate::object::AttributeValue;

/// Semantic type of an attribute value, as declared by a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Free-form text
    Text,
    /// Non-negative integer count
    Counter,
    /// Non-negative integer byte size
    SizeInBytes,
    /// Floating point measurement (e.g. entropy)
    Float,
    /// 128-bit digest as 32 lowercase hex characters
    Md5,
    /// 160-bit digest as 40 lowercase hex characters
    Sha1,
    /// 256-bit digest as 64 lowercase hex characters
    Sha256,
    /// 512-bit digest as 128 lowercase hex characters
    Sha512,
    /// Context-triggered piecewise hash signature
    Ssdeep,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::Text => "text",
            AttributeType::Counter => "counter",
            AttributeType::SizeInBytes => "size-in-bytes",
            AttributeType::Float => "float",
            AttributeType::Md5 => "md5",
            AttributeType::Sha1 => "sha1",
            AttributeType::Sha256 => "sha256",
            AttributeType::Sha512 => "sha512",
            AttributeType::Ssdeep => "ssdeep",
        }
    }

    /// Expected hex length for fixed-width digest types.
    fn hex_len(&self) -> Option<usize> {
        match self {
            AttributeType::Md5 => Some(32),
            AttributeType::Sha1 => Some(40),
            AttributeType::Sha256 => Some(64),
            AttributeType::Sha512 => Some(128),
            _ => None,
        }
    }

    /// Validate and coerce a value against this type.
    ///
    /// Integers are accepted for `Float` relations and coerced; everything
    /// else must match exactly. Returns the stored representation or a
    /// `TypeMismatch` naming the offending relation.
    pub fn coerce(
        &self,
        relation: &str,
        value: AttributeValue,
    ) -> Result<AttributeValue, ObjectError> {
        let mismatch = |expected: &'static str, got: &AttributeValue| ObjectError::TypeMismatch {
            relation: relation.to_string(),
            expected,
            got: got.kind().to_string(),
        };

        match self {
            AttributeType::Text => match value {
                AttributeValue::Text(_) => Ok(value),
                other => Err(mismatch("text", &other)),
            },
            AttributeType::Counter | AttributeType::SizeInBytes => match value {
                AttributeValue::Integer(n) if n >= 0 => Ok(value),
                other => Err(mismatch("non-negative integer", &other)),
            },
            AttributeType::Float => match value {
                AttributeValue::Float(_) => Ok(value),
                AttributeValue::Integer(n) => Ok(AttributeValue::Float(n as f64)),
                other => Err(mismatch("float", &other)),
            },
            AttributeType::Md5 | AttributeType::Sha1 | AttributeType::Sha256 | AttributeType::Sha512 => {
                let want = self.hex_len().unwrap_or(0);
                match value {
                    AttributeValue::Text(ref s)
                        if s.len() == want && s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) =>
                    {
                        Ok(value)
                    }
                    other => Err(mismatch("lowercase hex digest", &other)),
                }
            }
            AttributeType::Ssdeep => match value {
                AttributeValue::Text(ref s) if !s.is_empty() => Ok(value),
                other => Err(mismatch("non-empty fuzzy hash signature", &other)),
            },
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declaration of a single attribute relation within a template.
#[derive(Debug, Clone)]
pub struct AttributeDef {
    /// Declared semantic type of the relation's value
    pub attr_type: AttributeType,
    /// Whether the relation may appear more than once per object
    pub multiple: bool,
}

/// A named object template: the set of attribute relations an object
/// bound to it may carry.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    relations: HashMap<String, AttributeDef>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relations: HashMap::new(),
        }
    }

    /// Declare a relation. Builder-style, consumes and returns self.
    pub fn relation(mut self, name: &str, attr_type: AttributeType, multiple: bool) -> Self {
        self.relations.insert(
            name.to_string(),
            AttributeDef {
                attr_type,
                multiple,
            },
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the declaration for a relation, if declared.
    pub fn definition(&self, relation: &str) -> Option<&AttributeDef> {
        self.relations.get(relation)
    }
}

/// Source of object templates queried during object construction.
pub trait SchemaProvider {
    fn template(&self, name: &str) -> Option<&Template>;
}

/// Built-in templates for the file-level object and the Mach-O extractor.
#[derive(Debug)]
pub struct BuiltinSchemas {
    templates: HashMap<String, Template>,
}

impl BuiltinSchemas {
    pub fn new() -> Self {
        let mut templates = HashMap::new();
        for template in [
            Template::new("file")
                .relation("filename", AttributeType::Text, true)
                .relation("size-in-bytes", AttributeType::SizeInBytes, false)
                .relation("entropy", AttributeType::Float, false)
                .relation("md5", AttributeType::Md5, false)
                .relation("sha1", AttributeType::Sha1, false)
                .relation("sha256", AttributeType::Sha256, false)
                .relation("sha512", AttributeType::Sha512, false)
                .relation("ssdeep", AttributeType::Ssdeep, false),
            Template::new("macho")
                .relation("type", AttributeType::Text, false)
                .relation("name", AttributeType::Text, false)
                .relation("entrypoint-address", AttributeType::Counter, false)
                .relation("number-sections", AttributeType::Counter, false),
            Template::new("macho-section")
                .relation("name", AttributeType::Text, false)
                .relation("size-in-bytes", AttributeType::SizeInBytes, false)
                .relation("entropy", AttributeType::Float, false)
                .relation("md5", AttributeType::Md5, false)
                .relation("sha1", AttributeType::Sha1, false)
                .relation("sha256", AttributeType::Sha256, false)
                .relation("sha512", AttributeType::Sha512, false)
                .relation("ssdeep", AttributeType::Ssdeep, false),
        ] {
            templates.insert(template.name().to_string(), template);
        }
        Self { templates }
    }
}

impl Default for BuiltinSchemas {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaProvider for BuiltinSchemas {
    fn template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_present() {
        let schemas = BuiltinSchemas::new();
        for name in ["file", "macho", "macho-section"] {
            assert!(schemas.template(name).is_some(), "missing template {name}");
        }
        assert!(schemas.template("pe-section").is_none());
    }

    #[test]
    fn test_macho_template_relations() {
        let schemas = BuiltinSchemas::new();
        let macho = schemas.template("macho").unwrap();
        let def = macho.definition("number-sections").unwrap();
        assert_eq!(def.attr_type, AttributeType::Counter);
        assert!(!def.multiple);
        assert!(macho.definition("md5").is_none());
    }

    #[test]
    fn test_coerce_counter() {
        let ok = AttributeType::Counter
            .coerce("number-sections", AttributeValue::Integer(3))
            .unwrap();
        assert_eq!(ok, AttributeValue::Integer(3));

        let err = AttributeType::Counter
            .coerce("number-sections", AttributeValue::Integer(-1))
            .unwrap_err();
        assert!(matches!(err, ObjectError::TypeMismatch { .. }));
    }

    #[test]
    fn test_coerce_float_accepts_integer() {
        let coerced = AttributeType::Float
            .coerce("entropy", AttributeValue::Integer(4))
            .unwrap();
        assert_eq!(coerced, AttributeValue::Float(4.0));
    }

    #[test]
    fn test_coerce_digest_lengths() {
        let md5 = "d41d8cd98f00b204e9800998ecf8427e".to_string();
        assert!(AttributeType::Md5
            .coerce("md5", AttributeValue::Text(md5.clone()))
            .is_ok());
        // sha1 relation must reject an md5-length digest
        assert!(AttributeType::Sha1
            .coerce("sha1", AttributeValue::Text(md5))
            .is_err());
        // uppercase hex is rejected
        assert!(AttributeType::Md5
            .coerce(
                "md5",
                AttributeValue::Text("D41D8CD98F00B204E9800998ECF8427E".to_string())
            )
            .is_err());
    }

    #[test]
    fn test_coerce_ssdeep_rejects_empty() {
        assert!(AttributeType::Ssdeep
            .coerce("ssdeep", AttributeValue::Text(String::new()))
            .is_err());
        assert!(AttributeType::Ssdeep
            .coerce("ssdeep", AttributeValue::Text("8:4:ab:cd".to_string()))
            .is_ok());
    }
}
