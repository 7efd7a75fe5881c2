//! Lazily executed query description.

use domain::FilterCondition;

/// Filter and pagination applied by a store on `count` / `fetch`
///
/// # Example
///
/// ```rust
/// use crud_service::store::RecordQuery;
/// use domain::FilterCondition;
///
/// let query = RecordQuery::new()
///     .filter(FilterCondition::eq("status", "open"))
///     .limit(20)
///     .offset(40);
///
/// assert_eq!(query.conditions().len(), 1);
/// assert_eq!(query.max_records(), Some(20));
/// assert_eq!(query.skip(), Some(40));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    conditions: Vec<FilterCondition>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition; conditions are combined with AND
    #[must_use]
    pub fn filter(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn max_records(&self) -> Option<u64> {
        self.limit
    }

    pub fn skip(&self) -> Option<u64> {
        self.offset
    }

    /// Check if the query restricts the number of returned records
    pub fn is_paginated(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }
}
