//! Options for paginated listing.

use domain::{FieldSelection, FilterCondition, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use serde_json::Value;

/// Arguments of `retrieve_all`.
///
/// `page` and `per_page` are kept as received; they are validated by the
/// service so that a caller passing `"20"` gets an invalid-argument fault
/// instead of a silent conversion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    pub page: Value,
    pub per_page: Value,
    pub filter: FilterCondition,
    pub fields: FieldSelection,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: Value::from(DEFAULT_PAGE_NUMBER),
            per_page: Value::from(DEFAULT_PAGE_SIZE),
            filter: FilterCondition::default(),
            fields: FieldSelection::All,
        }
    }
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(mut self, page: impl Into<Value>) -> Self {
        self.page = page.into();
        self
    }

    #[must_use]
    pub fn per_page(mut self, per_page: impl Into<Value>) -> Self {
        self.per_page = per_page.into();
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterCondition) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }
}
