//! In-memory record store.
//!
//! Rows are kept ordered by id. Filters follow SQL semantics: comparisons
//! against a missing or null attribute never match, except for the
//! `= null` / `!= null` checks. Ids are keyed by their text, so numeric and
//! string ids compare as text on the `id` field.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use domain::{FieldSelection, FilterCondition, FilterOperator, Record, RecordId, ID_FIELD};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::store::{RecordQuery, RecordStore, Relationship, StorageError, StoreResult};

/// Schemaless store backed by a `BTreeMap`
pub struct MemoryStore {
    kind: String,
    rows: RwLock<BTreeMap<RecordId, Record>>,
    relationships: HashMap<String, Arc<dyn Relationship>>,
}

impl MemoryStore {
    /// Create an empty store for the given record type
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            rows: RwLock::new(BTreeMap::new()),
            relationships: HashMap::new(),
        }
    }

    /// Register a named relationship
    #[must_use]
    pub fn with_relationship(
        mut self,
        name: impl Into<String>,
        relationship: Arc<dyn Relationship>,
    ) -> Self {
        self.relationships.insert(name.into(), relationship);
        self
    }

    /// Number of stored rows
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn row_of(&self, record: &Record) -> Record {
        Record::from_attributes(self.kind.clone(), record.attributes().clone()).persisted()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn kind(&self) -> String {
        self.kind.clone()
    }

    async fn find_by_id(
        &self,
        id: &RecordId,
        fields: &FieldSelection,
    ) -> StoreResult<Option<Record>> {
        let rows = self.rows.read().await;
        Ok(rows.get(id).map(|row| row.only(fields)))
    }

    async fn save(&self, record: &Record) -> StoreResult<bool> {
        let id = record.id().ok_or(StorageError::MissingId)?;
        let mut rows = self.rows.write().await;

        if record.exists() {
            return Ok(match rows.get_mut(&id) {
                Some(row) => {
                    *row = self.row_of(record);
                    true
                }
                None => false,
            });
        }

        if rows.contains_key(&id) {
            return Err(StorageError::DuplicateKey(id.to_string()));
        }
        rows.insert(id, self.row_of(record));
        Ok(true)
    }

    async fn delete(&self, record: &Record) -> StoreResult<bool> {
        let id = record.id().ok_or(StorageError::MissingId)?;
        Ok(self.rows.write().await.remove(&id).is_some())
    }

    async fn count(&self, query: &RecordQuery) -> StoreResult<u64> {
        let rows = self.rows.read().await;
        let mut total = 0;
        for row in rows.values() {
            if matches_all(row, query.conditions())? {
                total += 1;
            }
        }
        Ok(total)
    }

    async fn fetch(
        &self,
        query: &RecordQuery,
        fields: &FieldSelection,
    ) -> StoreResult<Vec<Record>> {
        let rows = self.rows.read().await;
        let skip = to_usize(query.skip().unwrap_or(0));
        let take = query.max_records().map_or(usize::MAX, to_usize);

        let mut matched = Vec::new();
        for row in rows.values() {
            if matches_all(row, query.conditions())? {
                matched.push(row);
            }
        }

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|row| row.only(fields))
            .collect())
    }

    fn relationship(&self, name: &str) -> Option<Arc<dyn Relationship>> {
        self.relationships.get(name).cloned()
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn matches_all(row: &Record, conditions: &[FilterCondition]) -> StoreResult<bool> {
    for condition in conditions {
        if !condition_holds(row, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn condition_holds(row: &Record, condition: &FilterCondition) -> StoreResult<bool> {
    let actual = row.get(&condition.field).unwrap_or(&Value::Null);
    let expected = &condition.value;

    if condition.field == ID_FIELD {
        let actual = id_text(actual);
        let expected = match expected {
            Value::Array(items) => Value::Array(items.iter().map(id_text).collect()),
            other => id_text(other),
        };
        return compare_values(&actual, &expected, condition);
    }

    compare_values(actual, expected, condition)
}

/// Numeric ids as the text they are keyed by
fn id_text(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        other => other.clone(),
    }
}

fn compare_values(actual: &Value, expected: &Value, condition: &FilterCondition) -> StoreResult<bool> {
    if condition.is_null_check() {
        return Ok(match condition.operator {
            FilterOperator::Equal => actual.is_null(),
            _ => !actual.is_null(),
        });
    }
    if expected.is_null() {
        return Err(StorageError::query(format!(
            "operator {} cannot compare {} with null",
            condition.operator, condition.field
        )));
    }
    if actual.is_null() {
        return Ok(false);
    }

    let matched = match condition.operator {
        FilterOperator::Equal => values_equal(actual, expected),
        FilterOperator::NotEqual => !values_equal(actual, expected),
        FilterOperator::GreaterThan => compare(actual, expected) == Some(Ordering::Greater),
        FilterOperator::GreaterThanOrEqual => {
            matches!(compare(actual, expected), Some(Ordering::Greater | Ordering::Equal))
        }
        FilterOperator::LessThan => compare(actual, expected) == Some(Ordering::Less),
        FilterOperator::LessThanOrEqual => {
            matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal))
        }
        FilterOperator::Like => {
            let pattern = expected.as_str().ok_or_else(|| {
                StorageError::query(format!("LIKE on {} needs a string pattern", condition.field))
            })?;
            match actual {
                Value::String(text) => like(pattern, text),
                Value::Number(n) => like(pattern, &n.to_string()),
                _ => false,
            }
        }
        FilterOperator::In => {
            let candidates = expected.as_array().ok_or_else(|| {
                StorageError::query(format!("IN on {} needs an array", condition.field))
            })?;
            candidates.iter().any(|candidate| values_equal(actual, candidate))
        }
    };

    Ok(matched)
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// SQL LIKE: `%` matches any run of characters, `_` exactly one
fn like(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p).copied() {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(c) if c == '_' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, resume)) => {
                    p = star + 1;
                    t = resume + 1;
                    backtrack = Some((star, resume + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Record {
        Record::from_attributes("widget", value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_like() {
        assert!(like("te%", "test"));
        assert!(like("%st", "test"));
        assert!(like("t__t", "test"));
        assert!(like("%", ""));
        assert!(like("%e%t%", "test"));
        assert!(!like("t_t", "test"));
        assert!(!like("Te%", "test"));
        assert!(!like("", "test"));
    }

    #[test]
    fn test_null_checks() {
        let widget = row(json!({"id": "1", "deleted_at": null}));

        assert!(condition_holds(&widget, &FilterCondition::eq("deleted_at", Value::Null)).unwrap());
        assert!(condition_holds(&widget, &FilterCondition::eq("missing", Value::Null)).unwrap());
        assert!(condition_holds(&widget, &FilterCondition::default()).unwrap());
        assert!(!condition_holds(&widget, &FilterCondition::ne("deleted_at", Value::Null)).unwrap());
    }

    #[test]
    fn test_null_never_matches_comparisons() {
        let widget = row(json!({"id": "1"}));
        assert!(!condition_holds(&widget, &FilterCondition::ne("name", "x")).unwrap());

        let gt_null = FilterCondition::new("name", FilterOperator::GreaterThan, Value::Null);
        assert!(matches!(condition_holds(&widget, &gt_null), Err(StorageError::Query(_))));
    }

    #[test]
    fn test_ids_compare_as_text() {
        let widget = row(json!({"id": "42"}));

        assert!(condition_holds(&widget, &FilterCondition::eq("id", 42)).unwrap());
        assert!(condition_holds(&widget, &FilterCondition::new("id", FilterOperator::In, json!([1, 42]))).unwrap());
        assert!(condition_holds(&row(json!({"id": 7})), &FilterCondition::eq("id", "7")).unwrap());
        assert!(!condition_holds(&widget, &FilterCondition::eq("id", 4)).unwrap());
    }

    #[test]
    fn test_ordering_and_membership() {
        let widget = row(json!({"id": "1", "age": 30, "name": "bolt"}));

        let cases = [
            (FilterCondition::new("age", FilterOperator::GreaterThan, 18), true),
            (FilterCondition::new("age", FilterOperator::LessThanOrEqual, 30.0), true),
            (FilterCondition::new("age", FilterOperator::LessThan, 30), false),
            (FilterCondition::new("name", FilterOperator::GreaterThanOrEqual, "a"), true),
            (FilterCondition::new("age", FilterOperator::GreaterThan, "18"), false),
            (FilterCondition::new("name", FilterOperator::In, json!(["nut", "bolt"])), true),
            (FilterCondition::new("age", FilterOperator::In, json!([1, 2])), false),
            (FilterCondition::eq("age", 30), true),
        ];

        for (condition, expected) in cases {
            assert_eq!(condition_holds(&widget, &condition).unwrap(), expected, "{condition:?}");
        }
    }

    #[test]
    fn test_in_requires_array() {
        let widget = row(json!({"id": "1", "age": 30}));
        let condition = FilterCondition::new("age", FilterOperator::In, 30);
        assert!(matches!(condition_holds(&widget, &condition), Err(StorageError::Query(_))));
    }
}
