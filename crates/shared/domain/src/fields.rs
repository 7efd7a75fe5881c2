//! Field selection for reads.

use serde::{Deserialize, Serialize};

/// Which attributes a read should return
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSelection {
    /// Every attribute
    #[default]
    All,
    /// Only the named attributes
    Only(Vec<String>),
}

impl FieldSelection {
    /// Select the given fields. An empty list selects all fields.
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            FieldSelection::All
        } else {
            FieldSelection::Only(fields)
        }
    }

    /// Check if a field is part of the selection
    pub fn includes(&self, field: &str) -> bool {
        match self {
            FieldSelection::All => true,
            FieldSelection::Only(fields) => fields.iter().any(|f| f == field),
        }
    }

    /// The selection extended with `field`
    pub fn including(&self, field: &str) -> FieldSelection {
        match self {
            FieldSelection::Only(fields) if !self.includes(field) => {
                let mut fields = fields.clone();
                fields.push(field.to_string());
                FieldSelection::Only(fields)
            }
            other => other.clone(),
        }
    }
}
