//! SeaORM-backed record store.
//!
//! Any entity can be exposed as records through a [`FieldMap`] that maps
//! public field names to columns and declares how JSON values are coerced
//! into column values.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Query, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use serde_json::Value;
use uuid::Uuid;

use domain::{FieldSelection, FilterCondition, FilterOperator, Record, RecordId, ID_FIELD};

use crate::store::{RecordQuery, RecordStore, Relationship, StorageError, StoreResult};

/// How JSON values are coerced for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I32,
    I64,
    F64,
    Bool,
    Uuid,
    DateTimeUtc,
    Json,
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::I32 => "a 32-bit integer",
            FieldKind::I64 => "an integer",
            FieldKind::F64 => "a number",
            FieldKind::Bool => "a boolean",
            FieldKind::Uuid => "a UUID",
            FieldKind::DateTimeUtc => "an RFC 3339 timestamp",
            FieldKind::Json => "a JSON value",
        }
    }

    fn null(&self) -> sea_orm::Value {
        match self {
            FieldKind::String => Option::<String>::None.into(),
            FieldKind::I32 => Option::<i32>::None.into(),
            FieldKind::I64 => Option::<i64>::None.into(),
            FieldKind::F64 => Option::<f64>::None.into(),
            FieldKind::Bool => Option::<bool>::None.into(),
            FieldKind::Uuid => Option::<Uuid>::None.into(),
            FieldKind::DateTimeUtc => Option::<DateTime<Utc>>::None.into(),
            FieldKind::Json => Option::<Value>::None.into(),
        }
    }
}

/// A mapped column
#[derive(Clone)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
}

/// Public field name -> column mapping, in declaration order
#[derive(Clone)]
#[must_use]
pub struct FieldMap<E: EntityTrait> {
    fields: Vec<(String, Field<E>)>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn insert(mut self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        let api_name = api_name.into();
        self.fields.retain(|(name, _)| *name != api_name);
        self.fields.push((api_name, Field { col, kind }));
        self
    }

    pub fn get(&self, api_name: &str) -> Option<&Field<E>> {
        self.fields
            .iter()
            .find(|(name, _)| name == api_name)
            .map(|(_, field)| field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field<E>)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    fn field(&self, api_name: &str) -> StoreResult<&Field<E>> {
        self.get(api_name)
            .ok_or_else(|| StorageError::UnknownField(api_name.to_string()))
    }
}

/// Coerce a JSON value into a column value of the given kind.
///
/// Integer kinds also accept numeric strings, so string record ids work
/// against integer primary keys.
fn coerce(kind: FieldKind, field: &str, value: &Value) -> StoreResult<sea_orm::Value> {
    let mismatch = || StorageError::type_mismatch(field, kind.expected());

    let coerced: sea_orm::Value = match (kind, value) {
        (_, Value::Null) => kind.null(),
        (FieldKind::String, Value::String(s)) => s.clone().into(),
        (FieldKind::I32, Value::Number(n)) => {
            let n = n.as_i64().ok_or_else(mismatch)?;
            i32::try_from(n).map_err(|_| mismatch())?.into()
        }
        (FieldKind::I32, Value::String(s)) => s.trim().parse::<i32>().map_err(|_| mismatch())?.into(),
        (FieldKind::I64, Value::Number(n)) => n.as_i64().ok_or_else(mismatch)?.into(),
        (FieldKind::I64, Value::String(s)) => s.trim().parse::<i64>().map_err(|_| mismatch())?.into(),
        (FieldKind::F64, Value::Number(n)) => n.as_f64().ok_or_else(mismatch)?.into(),
        (FieldKind::Bool, Value::Bool(b)) => (*b).into(),
        (FieldKind::Uuid, Value::String(s)) => Uuid::parse_str(s).map_err(|_| mismatch())?.into(),
        (FieldKind::DateTimeUtc, Value::String(s)) => {
            s.parse::<DateTime<Utc>>().map_err(|_| mismatch())?.into()
        }
        (FieldKind::Json, v) => v.clone().into(),
        _ => return Err(mismatch()),
    };

    Ok(coerced)
}

/// Record store over a SeaORM entity
pub struct SeaOrmStore<E: EntityTrait> {
    db: DatabaseConnection,
    kind: String,
    fields: FieldMap<E>,
    relationships: HashMap<String, Arc<dyn Relationship>>,
}

impl<E: EntityTrait> SeaOrmStore<E> {
    /// Create a store; `fields` must map the `id` field to the primary key
    pub fn new(db: DatabaseConnection, kind: impl Into<String>, fields: FieldMap<E>) -> Self {
        Self {
            db,
            kind: kind.into(),
            fields,
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

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Give back the owned connection, e.g. to inspect a mock's statement log
    pub fn into_connection(self) -> DatabaseConnection {
        self.db
    }

    fn id_condition(&self, id: &RecordId) -> StoreResult<Condition> {
        let field = self.fields.field(ID_FIELD)?;
        let value = coerce(field.kind, ID_FIELD, &Value::String(id.as_str().to_string()))?;
        Ok(Condition::all().add(field.col.eq(value)))
    }

    fn condition(&self, conditions: &[FilterCondition]) -> StoreResult<Condition> {
        let mut condition = Condition::all();

        for filter in conditions {
            let field = self.fields.field(&filter.field)?;
            let col = field.col;

            if filter.is_null_check() {
                condition = condition.add(match filter.operator {
                    FilterOperator::Equal => col.is_null(),
                    _ => col.is_not_null(),
                });
                continue;
            }
            if filter.value.is_null() {
                return Err(StorageError::query(format!(
                    "operator {} cannot compare {} with null",
                    filter.operator, filter.field
                )));
            }

            let expr = match filter.operator {
                FilterOperator::Like => {
                    let pattern = filter.value.as_str().ok_or_else(|| {
                        StorageError::query(format!("LIKE on {} needs a string pattern", filter.field))
                    })?;
                    col.like(pattern)
                }
                FilterOperator::In => {
                    let items = filter.value.as_array().ok_or_else(|| {
                        StorageError::query(format!("IN on {} needs an array", filter.field))
                    })?;
                    let values = items
                        .iter()
                        .map(|item| coerce(field.kind, &filter.field, item))
                        .collect::<StoreResult<Vec<_>>>()?;
                    col.is_in(values)
                }
                op => {
                    let value = coerce(field.kind, &filter.field, &filter.value)?;
                    match op {
                        FilterOperator::Equal => col.eq(value),
                        FilterOperator::NotEqual => col.ne(value),
                        FilterOperator::GreaterThan => col.gt(value),
                        FilterOperator::GreaterThanOrEqual => col.gte(value),
                        FilterOperator::LessThan => col.lt(value),
                        _ => col.lte(value),
                    }
                }
            };
            condition = condition.add(expr);
        }

        Ok(condition)
    }

    /// `SELECT <selected columns AS api names>` over the entity
    fn select(&self, fields: &FieldSelection) -> StoreResult<Select<E>> {
        if let FieldSelection::Only(names) = fields {
            for name in names {
                self.fields.field(name)?;
            }
        }

        let mut select = E::find().select_only();
        for (name, field) in self.fields.iter().filter(|(name, _)| fields.includes(name)) {
            select = select.column_as(field.col, name);
        }
        Ok(select)
    }

    fn to_record(&self, row: Value) -> StoreResult<Record> {
        match row {
            Value::Object(attributes) => {
                Ok(Record::from_attributes(self.kind.clone(), attributes).persisted())
            }
            other => Err(StorageError::Backend(format!("unexpected row shape: {other}"))),
        }
    }

    /// Column/value pairs for every attribute of the record
    fn column_values(&self, record: &Record) -> StoreResult<Vec<(E::Column, sea_orm::Value)>> {
        record
            .attributes()
            .iter()
            .map(|(name, value)| {
                let field = self.fields.field(name)?;
                Ok((field.col, coerce(field.kind, name, value)?))
            })
            .collect()
    }

    async fn insert(&self, record: &Record) -> StoreResult<bool> {
        let (columns, values): (Vec<_>, Vec<_>) = self.column_values(record)?.into_iter().unzip();

        let mut stmt = Query::insert();
        stmt.into_table(E::default().table_ref())
            .columns(columns)
            .values(values.into_iter().map(SimpleExpr::from))
            .map_err(|e| StorageError::query(e.to_string()))?;

        let backend = self.db.get_database_backend();
        let result = self.db.execute(backend.build(&stmt)).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update(&self, record: &Record, id: &RecordId) -> StoreResult<bool> {
        let mut update = E::update_many().filter(self.id_condition(id)?);
        for (col, value) in self.column_values(record)? {
            update = update.col_expr(col, SimpleExpr::from(value));
        }

        let result = update.exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl<E> RecordStore for SeaOrmStore<E>
where
    E: EntityTrait,
    E::Model: Sync,
{
    fn kind(&self) -> String {
        self.kind.clone()
    }

    async fn find_by_id(
        &self,
        id: &RecordId,
        fields: &FieldSelection,
    ) -> StoreResult<Option<Record>> {
        let row = self
            .select(fields)?
            .filter(self.id_condition(id)?)
            .into_json()
            .one(&self.db)
            .await?;

        row.map(|row| self.to_record(row)).transpose()
    }

    async fn save(&self, record: &Record) -> StoreResult<bool> {
        let id = record.id().ok_or(StorageError::MissingId)?;

        if record.exists() {
            self.update(record, &id).await
        } else {
            self.insert(record).await
        }
    }

    async fn delete(&self, record: &Record) -> StoreResult<bool> {
        let id = record.id().ok_or(StorageError::MissingId)?;

        let result = E::delete_many()
            .filter(self.id_condition(&id)?)
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn count(&self, query: &RecordQuery) -> StoreResult<u64> {
        let total = E::find()
            .filter(self.condition(query.conditions())?)
            .count(&self.db)
            .await?;

        Ok(total)
    }

    async fn fetch(
        &self,
        query: &RecordQuery,
        fields: &FieldSelection,
    ) -> StoreResult<Vec<Record>> {
        let mut select = self
            .select(fields)?
            .filter(self.condition(query.conditions())?)
            .order_by_asc(self.fields.field(ID_FIELD)?.col);

        if let Some(limit) = query.max_records() {
            select = select.limit(limit);
        }
        if let Some(offset) = query.skip() {
            select = select.offset(offset);
        }

        let rows = select.into_json().all(&self.db).await?;
        rows.into_iter().map(|row| self.to_record(row)).collect()
    }

    fn relationship(&self, name: &str) -> Option<Arc<dyn Relationship>> {
        self.relationships.get(name).cloned()
    }
}
