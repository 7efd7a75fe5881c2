//! CRUD service - Retrieve, create, update, delete and list records.
//!
//! Storage faults never leave this module: each is logged with its
//! logging context and re-raised as the matching `AppError`.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{json, Value};

use common::{
    logging_context, AppError, AppResult, CrudConfig, EventLog, Fault, TemplateKey, TracingLog,
};
use domain::{Attributes, FieldSelection, PageRequest, PageResult, Record, RecordId, ID_FIELD};

use super::options::ListOptions;
use crate::store::{RecordQuery, RecordStore, StorageError};

const CREATE_METHOD: &str = "CrudManager::create";
const UPDATE_METHOD: &str = "CrudManager::update";
const ADD_RELATIONSHIP_METHOD: &str = "CrudManager::add_relationship";

/// CRUD service trait for dependency injection.
#[async_trait]
pub trait CrudService: Send + Sync {
    /// Get a record by id, eager-loading the named relationships
    async fn retrieve(
        &self,
        store: &dyn RecordStore,
        id: &RecordId,
        fields: &FieldSelection,
        relationships: &[String],
    ) -> AppResult<Record>;

    /// Assign `id` and every input attribute to `record`, then persist it
    async fn create(
        &self,
        store: &dyn RecordStore,
        record: Record,
        input: Attributes,
        id: &RecordId,
    ) -> AppResult<Record>;

    /// Apply input attributes to an existing record and persist it
    async fn update(&self, store: &dyn RecordStore, input: Attributes, id: &RecordId)
        -> AppResult<Record>;

    /// Delete an existing record
    async fn delete(&self, store: &dyn RecordStore, id: &RecordId) -> AppResult<bool>;

    /// List one page of records matching the filter
    async fn retrieve_all(
        &self,
        store: &dyn RecordStore,
        options: ListOptions,
    ) -> AppResult<PageResult<Record>>;

    /// Link `related` to `record` through the named relationship
    async fn add_relationship(
        &self,
        store: &dyn RecordStore,
        record: &Record,
        related: Record,
        name: &str,
    ) -> AppResult<Record>;
}

/// Concrete implementation of CrudService with injected logging.
pub struct CrudManager {
    log: Arc<dyn EventLog>,
    config: CrudConfig,
}

impl CrudManager {
    /// Create new CRUD service instance with a logger and configuration
    pub fn new(log: Arc<dyn EventLog>, config: CrudConfig) -> Self {
        Self { log, config }
    }

    /// Service logging through `tracing`, configured from the environment
    pub fn from_env() -> Self {
        Self::new(Arc::new(TracingLog), CrudConfig::from_env())
    }

    pub fn config(&self) -> &CrudConfig {
        &self.config
    }

    fn render(&self, key: TemplateKey, args: &[&dyn Display]) -> String {
        self.config.templates.render(key, args)
    }

    #[track_caller]
    fn log_fault<F: Fault>(&self, message: &str, fault: &F, extra: &[Attributes]) {
        let context = logging_context(fault, extra, self.config.include_trace);
        self.log.error(message, &context);
    }

    #[track_caller]
    fn retrieval_failed(&self, err: StorageError) -> AppError {
        let message = self.render(TemplateKey::RetrievalError, &[]);
        self.log_fault(&message, &err, &[]);
        AppError::operation_failed_from(err)
    }

    async fn load_relationships(
        &self,
        store: &dyn RecordStore,
        record: &mut Record,
        names: &[String],
    ) -> AppResult<()> {
        if names.is_empty() {
            return Ok(());
        }

        let kind = store.kind();
        let mut relationships = Vec::with_capacity(names.len());
        for name in names {
            let relationship = store.relationship(name).ok_or_else(|| {
                AppError::invalid_argument(format!("{kind} has no relationship named {name}"))
            })?;
            relationships.push((name, relationship));
        }

        let parent = &*record;
        let loaded = try_join_all(relationships.iter().map(|(name, relationship)| async move {
            relationship.load(parent).await.map_err(|err| (*name, err))
        }))
        .await;

        match loaded {
            Ok(related) => {
                for ((name, _), records) in relationships.iter().zip(related) {
                    record.set_relation(name.as_str(), records);
                }
                Ok(())
            }
            Err((name, err)) => {
                let id = record.id().map(|id| id.to_string()).unwrap_or_default();
                let message = self.render(TemplateKey::NotFound, &[&kind, &id]);
                self.log_fault(
                    &message,
                    &err,
                    &[context(json!({"id": id, "relationship": name}))],
                );
                Err(AppError::not_found_from(err))
            }
        }
    }
}

impl Default for CrudManager {
    fn default() -> Self {
        Self::new(Arc::new(TracingLog), CrudConfig::default())
    }
}

fn context(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

fn with_id(mut input: Attributes, id: &RecordId) -> Attributes {
    input.insert("id".to_string(), id.into());
    input
}

#[async_trait]
impl CrudService for CrudManager {
    async fn retrieve(
        &self,
        store: &dyn RecordStore,
        id: &RecordId,
        fields: &FieldSelection,
        relationships: &[String],
    ) -> AppResult<Record> {
        // Relationships are keyed on the parent id, so read it even when unselected
        let read_fields = if relationships.is_empty() {
            fields.clone()
        } else {
            fields.including(ID_FIELD)
        };

        let mut record = match store.find_by_id(id, &read_fields).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                let message = self.render(TemplateKey::NotFound, &[&store.kind(), id]);
                self.log.info(&message, &context(json!({ "id": id })));
                return Err(AppError::not_found(message));
            }
            Err(err) => {
                let message = self.render(TemplateKey::NotFound, &[&store.kind(), id]);
                self.log_fault(&message, &err, &[context(json!({ "id": id }))]);
                return Err(AppError::not_found_from(err));
            }
        };

        self.load_relationships(store, &mut record, relationships).await?;
        if read_fields != *fields {
            record = record.only(fields);
        }
        Ok(record)
    }

    async fn create(
        &self,
        store: &dyn RecordStore,
        mut record: Record,
        input: Attributes,
        id: &RecordId,
    ) -> AppResult<Record> {
        record.set_id(id);
        record.fill(input.clone());

        match store.save(&record).await {
            Ok(true) => {
                record.mark_persisted();
                Ok(record)
            }
            Ok(false) => {
                let message = self.render(TemplateKey::CreateFailed, &[&store.kind(), &CREATE_METHOD]);
                self.log.error(&message, &with_id(input, id));
                Err(AppError::save_failed(message))
            }
            Err(err) => {
                let message = self.render(TemplateKey::CreateFailed, &[&store.kind(), &CREATE_METHOD]);
                self.log_fault(&message, &err, &[with_id(input, id)]);
                Err(AppError::save_failed_from(err))
            }
        }
    }

    async fn update(
        &self,
        store: &dyn RecordStore,
        input: Attributes,
        id: &RecordId,
    ) -> AppResult<Record> {
        let mut record = self.retrieve(store, id, &FieldSelection::All, &[]).await?;
        record.fill(input.clone());

        match store.save(&record).await {
            Ok(true) => Ok(record),
            Ok(false) => {
                let message =
                    self.render(TemplateKey::UpdateFailed, &[&store.kind(), id, &UPDATE_METHOD]);
                self.log.error(&message, &with_id(input, id));
                Err(AppError::save_failed(message))
            }
            Err(err) => {
                let message =
                    self.render(TemplateKey::UpdateFailed, &[&store.kind(), id, &UPDATE_METHOD]);
                self.log_fault(&message, &err, &[with_id(input, id)]);
                Err(AppError::save_failed_from(err))
            }
        }
    }

    async fn delete(&self, store: &dyn RecordStore, id: &RecordId) -> AppResult<bool> {
        let record = self.retrieve(store, id, &FieldSelection::All, &[]).await?;

        match store.delete(&record).await {
            Ok(true) => Ok(true),
            Ok(false) => {
                let message = self.render(TemplateKey::DeleteFailed, &[&store.kind(), id]);
                self.log.error(&message, &context(json!({ "id": id })));
                Err(AppError::delete_failed(message))
            }
            Err(err) => {
                let message = self.render(TemplateKey::DeleteFailed, &[&store.kind(), id]);
                self.log_fault(&message, &err, &[context(json!({ "id": id }))]);
                Err(AppError::delete_failed_from(err))
            }
        }
    }

    async fn retrieve_all(
        &self,
        store: &dyn RecordStore,
        options: ListOptions,
    ) -> AppResult<PageResult<Record>> {
        let request = match PageRequest::from_values(&options.page, &options.per_page) {
            Ok(request) => request,
            Err(err) => {
                let message = self.render(TemplateKey::RetrievalError, &[]);
                self.log.error(
                    &message,
                    &context(json!({ "page": options.page, "per_page": options.per_page })),
                );
                return Err(err.into());
            }
        };

        let query = RecordQuery::new().filter(options.filter);
        let total = match store.count(&query).await {
            Ok(total) => total,
            Err(err) => return Err(self.retrieval_failed(err)),
        };

        let query = match request.limit() {
            Some(limit) => query.limit(limit).offset(request.offset()),
            None => query,
        };
        let models = match store.fetch(&query, &options.fields).await {
            Ok(models) => models,
            Err(err) => return Err(self.retrieval_failed(err)),
        };
        tracing::debug!(
            kind = %store.kind(),
            page = request.page,
            per_page = request.per_page.as_i64(),
            total,
            "Records listed"
        );

        Ok(PageResult::new(models, &request, total))
    }

    async fn add_relationship(
        &self,
        store: &dyn RecordStore,
        record: &Record,
        related: Record,
        name: &str,
    ) -> AppResult<Record> {
        let relationship = store.relationship(name).ok_or_else(|| {
            AppError::invalid_argument(format!("{} has no relationship named {name}", store.kind()))
        })?;

        match relationship.associate(record, related).await {
            Ok(related) => Ok(related),
            Err(err) => {
                let message = self.render(
                    TemplateKey::RelationshipFailed,
                    &[&store.kind(), &name, &ADD_RELATIONSHIP_METHOD],
                );
                self.log_fault(&message, &err, &[context(json!({ "relationship": name }))]);
                Err(AppError::operation_failed_from(err))
            }
        }
    }
}
