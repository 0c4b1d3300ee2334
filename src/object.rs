//! Core object model: typed attributes, references and schema-bound objects.
//!
//! An [`Object`] is a container of [`Attribute`]s and outgoing
//! [`Reference`]s, bound at construction to a template served by a
//! [`SchemaProvider`]. Attributes are validated against the template as
//! they are added and are immutable afterwards; references are directed
//! edges to other objects' identities and may point at objects that do
//! not exist yet (forward references are resolved at export time by the
//! consuming platform, not here).

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::error::{ObjectError, Result};
use crate::schema::{SchemaProvider, Template};

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl AttributeValue {
    /// Short tag describing the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Text(_) => "text",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Float(_) => "float",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => write!(f, "{}", s),
            AttributeValue::Integer(n) => write!(f, "{}", n),
            AttributeValue::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::Integer(n)
    }
}

impl From<u64> for AttributeValue {
    fn from(n: u64) -> Self {
        AttributeValue::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<usize> for AttributeValue {
    fn from(n: usize) -> Self {
        AttributeValue::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttributeValue {
    fn from(x: f64) -> Self {
        AttributeValue::Float(x)
    }
}

/// A single named, typed value owned by exactly one [`Object`].
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    /// Relation name declared by the owning object's template
    pub object_relation: String,
    /// Semantic type tag from the template (e.g. "sha256", "counter")
    #[serde(rename = "type")]
    pub attr_type: String,
    /// Validated, possibly coerced value
    pub value: AttributeValue,
    /// Stable identity of this attribute record
    pub uuid: Uuid,
    /// Extra exported key/value pairs (category, to_ids and the like)
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

/// A directed, typed edge from one object to another object's identity.
///
/// The target is not required to resolve at construction time; children
/// referenced before they are exported are legal.
#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    pub source_uuid: Uuid,
    pub referenced_uuid: Uuid,
    pub relationship_type: String,
    pub comment: String,
}

/// Export view of an object; field renames match the platform's envelope.
#[derive(Serialize)]
struct ObjectRecord<'a> {
    name: &'a str,
    uuid: Uuid,
    timestamp: i64,
    #[serde(rename = "Attribute")]
    attributes: &'a [Attribute],
    #[serde(rename = "ObjectReference")]
    references: &'a [Reference],
}

/// A schema-bound container of attributes and outgoing references.
#[derive(Debug, Clone)]
pub struct Object {
    uuid: Uuid,
    timestamp: DateTime<Utc>,
    template: Template,
    standalone: bool,
    default_parameters: Map<String, Value>,
    attributes: Vec<Attribute>,
    references: Vec<Reference>,
}

impl Object {
    /// Create an object bound to `template_name`.
    ///
    /// Fails with `SchemaNotFound` if the provider does not know the
    /// template. The template's declarations are captured here so later
    /// `add_attribute` calls validate without re-querying the provider.
    pub fn new(
        schema: &dyn SchemaProvider,
        template_name: &str,
        standalone: bool,
    ) -> Result<Self> {
        let template = schema
            .template(template_name)
            .ok_or_else(|| ObjectError::SchemaNotFound(template_name.to_string()))?
            .clone();
        Ok(Self {
            uuid: Uuid::new_v4(),
            timestamp: Utc::now(),
            template,
            standalone,
            default_parameters: Map::new(),
            attributes: Vec::new(),
            references: Vec::new(),
        })
    }

    /// Replace the generated uuid with a caller-supplied one.
    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    /// Set extra key/value pairs stamped onto every attribute added later.
    pub fn with_default_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.default_parameters = parameters;
        self
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn template_name(&self) -> &str {
        self.template.name()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn standalone(&self) -> bool {
        self.standalone
    }

    pub fn default_parameters(&self) -> &Map<String, Value> {
        &self.default_parameters
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// First attribute with the given relation, if any.
    pub fn attribute(&self, relation: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.object_relation == relation)
    }

    /// Append a validated attribute and return it.
    ///
    /// The relation must be declared by the template (`UnknownAttribute`
    /// otherwise) and the value must satisfy its declared type. Re-adding
    /// a single-valued relation is rejected with `DuplicateAttribute`;
    /// existing attributes are never overwritten. The returned reference
    /// carries the stored, possibly coerced value.
    pub fn add_attribute(
        &mut self,
        relation: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<&Attribute> {
        let def = self.template.definition(relation).ok_or_else(|| {
            ObjectError::UnknownAttribute {
                template: self.template.name().to_string(),
                relation: relation.to_string(),
            }
        })?;
        if !def.multiple && self.attributes.iter().any(|a| a.object_relation == relation) {
            return Err(ObjectError::DuplicateAttribute {
                template: self.template.name().to_string(),
                relation: relation.to_string(),
            });
        }
        let value = def.attr_type.coerce(relation, value.into())?;
        let idx = self.attributes.len();
        self.attributes.push(Attribute {
            object_relation: relation.to_string(),
            attr_type: def.attr_type.as_str().to_string(),
            value,
            uuid: Uuid::new_v4(),
            parameters: self.default_parameters.clone(),
        });
        Ok(&self.attributes[idx])
    }

    /// Append a reference from this object to `referenced_uuid`.
    ///
    /// No check that the target exists; forward references are legal.
    pub fn add_reference(
        &mut self,
        referenced_uuid: Uuid,
        relationship_type: &str,
        comment: &str,
    ) -> &Reference {
        let idx = self.references.len();
        self.references.push(Reference {
            source_uuid: self.uuid,
            referenced_uuid,
            relationship_type: relationship_type.to_string(),
            comment: comment.to_string(),
        });
        &self.references[idx]
    }

    /// Export the object with its attributes and references, preserving
    /// insertion order in both arrays. Pure and idempotent.
    pub fn to_dict(&self) -> Value {
        let record = ObjectRecord {
            name: self.template.name(),
            uuid: self.uuid,
            timestamp: self.timestamp.timestamp(),
            attributes: &self.attributes,
            references: &self.references,
        };
        serde_json::to_value(&record).unwrap_or(Value::Null)
    }

    /// JSON export. Standalone objects are wrapped in an `{"Object": ...}`
    /// envelope so they can be shipped on their own; non-standalone
    /// objects export bare, for embedding in a caller's event.
    pub fn to_json(&self) -> Result<String> {
        let dict = self.to_dict();
        let out = if self.standalone {
            let mut envelope = Map::new();
            envelope.insert("Object".to_string(), dict);
            Value::Object(envelope)
        } else {
            dict
        };
        serde_json::to_string(&out).map_err(|e| ObjectError::Serialization(e.to_string()))
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Object '{}' ({}, {} attributes, {} references)",
            self.template.name(),
            self.uuid,
            self.attributes.len(),
            self.references.len()
        )
    }
}
