//! One-to-many relationship over a child store.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{FieldSelection, FilterCondition, Record, ID_FIELD};
use serde_json::Value;

use super::error::{StorageError, StoreResult};
use super::query::RecordQuery;
use super::record_store::{RecordStore, Relationship};

/// Children are the records of `store` whose `foreign_key` holds the
/// parent's id.
pub struct HasMany {
    store: Arc<dyn RecordStore>,
    foreign_key: String,
}

impl HasMany {
    pub fn new(store: Arc<dyn RecordStore>, foreign_key: impl Into<String>) -> Self {
        Self {
            store,
            foreign_key: foreign_key.into(),
        }
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    fn parent_key(parent: &Record) -> StoreResult<Value> {
        match parent.get(ID_FIELD) {
            Some(Value::Null) | None => Err(StorageError::MissingId),
            Some(id) => Ok(id.clone()),
        }
    }
}

#[async_trait]
impl Relationship for HasMany {
    async fn load(&self, parent: &Record) -> StoreResult<Vec<Record>> {
        let key = Self::parent_key(parent)?;
        let query = RecordQuery::new().filter(FilterCondition::eq(self.foreign_key.as_str(), key));

        self.store.fetch(&query, &FieldSelection::All).await
    }

    async fn associate(&self, parent: &Record, mut related: Record) -> StoreResult<Record> {
        let key = Self::parent_key(parent)?;
        related.set(self.foreign_key.as_str(), key);

        if !self.store.save(&related).await? {
            return Err(StorageError::NotSaved {
                kind: self.store.kind(),
            });
        }

        Ok(related.persisted())
    }
}
