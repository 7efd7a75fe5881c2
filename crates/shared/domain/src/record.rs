//! Record entity and related types.
//!
//! A record is a single persisted row modelled as a string-keyed attribute
//! map. Any key may be assigned; whether a storage back-end accepts it is
//! the back-end's decision.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::constants::ID_FIELD;
use crate::fields::FieldSelection;

/// Attribute map of a record (field name -> JSON value)
pub type Attributes = Map<String, Value>;

/// Unique record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        RecordId(id.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId(id.to_string())
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        Value::String(id.0)
    }
}

impl From<&RecordId> for Value {
    fn from(id: &RecordId) -> Self {
        Value::String(id.0.clone())
    }
}

/// Persisted record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Record type name, used in log messages
    #[serde(skip)]
    kind: String,
    #[serde(flatten)]
    attributes: Attributes,
    /// Eager-loaded related records by relationship name
    #[serde(flatten)]
    relations: BTreeMap<String, Vec<Record>>,
    /// Whether the record is known to storage (update vs insert on save)
    #[serde(skip)]
    exists: bool,
}

impl Record {
    /// Create an empty, not yet persisted record of the given type
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Attributes::new(),
            relations: BTreeMap::new(),
            exists: false,
        }
    }

    /// Create a record from an attribute map
    pub fn from_attributes(kind: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            attributes,
            ..Self::new(kind)
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Identifier taken from the `id` attribute (string or number)
    pub fn id(&self) -> Option<RecordId> {
        match self.attributes.get(ID_FIELD)? {
            Value::String(s) => Some(RecordId::new(s.clone())),
            Value::Number(n) => Some(RecordId::new(n.to_string())),
            _ => None,
        }
    }

    pub fn set_id(&mut self, id: &RecordId) {
        self.attributes.insert(ID_FIELD.to_string(), id.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Assign every input key onto the record, overwriting existing values
    pub fn fill(&mut self, input: Attributes) {
        for (key, value) in input {
            self.attributes.insert(key, value);
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn into_attributes(self) -> Attributes {
        self.attributes
    }

    /// Copy of this record restricted to the selected fields
    pub fn only(&self, fields: &FieldSelection) -> Record {
        let attributes = match fields {
            FieldSelection::All => self.attributes.clone(),
            FieldSelection::Only(_) => self
                .attributes
                .iter()
                .filter(|(key, _)| fields.includes(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        };

        Record {
            kind: self.kind.clone(),
            attributes,
            relations: self.relations.clone(),
            exists: self.exists,
        }
    }

    pub fn relation(&self, name: &str) -> Option<&[Record]> {
        self.relations.get(name).map(Vec::as_slice)
    }

    pub fn set_relation(&mut self, name: impl Into<String>, records: Vec<Record>) {
        self.relations.insert(name.into(), records);
    }

    pub fn relations(&self) -> &BTreeMap<String, Vec<Record>> {
        &self.relations
    }

    /// Check if the record was read from or written to storage
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn mark_persisted(&mut self) {
        self.exists = true;
    }

    /// Builder form of [`Record::mark_persisted`]
    #[must_use]
    pub fn persisted(mut self) -> Self {
        self.exists = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_from_string_and_number() {
        let mut record = Record::new("widget");
        assert!(record.id().is_none());

        record.set("id", "ab43ca3434f324acde");
        assert_eq!(record.id(), Some(RecordId::from("ab43ca3434f324acde")));

        record.set("id", 42);
        assert_eq!(record.id(), Some(RecordId::from(42_i64)));
    }

    #[test]
    fn test_fill_keeps_unknown_keys() {
        let mut record = Record::new("widget");
        record.set("name", "old");

        let input = json!({"name": "new", "anything": [1, 2]});
        record.fill(input.as_object().cloned().unwrap());

        assert_eq!(record.get("name"), Some(&json!("new")));
        assert_eq!(record.get("anything"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_only_projects_fields() {
        let mut record = Record::new("widget");
        record.set("id", "1");
        record.set("name", "test");
        record.set("description", "desc");

        let projected = record.only(&FieldSelection::only(["id", "name"]));
        assert_eq!(projected.attributes().len(), 2);
        assert!(projected.get("description").is_none());
        assert_eq!(record.only(&FieldSelection::All), record);
    }

    #[test]
    fn test_serializes_relations_alongside_attributes() {
        let mut comment = Record::new("comment");
        comment.set("id", "c1");

        let mut post = Record::new("post");
        post.set("id", "p1");
        post.set_relation("comments", vec![comment]);

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value, json!({"id": "p1", "comments": [{"id": "c1"}]}));
    }

    #[test]
    fn test_new_record_is_not_persisted() {
        let record = Record::new("widget");
        assert!(!record.exists());
        assert!(record.persisted().exists());
    }
}
