//! Filter conditions for record queries.
//!
//! # Example
//!
//! ```rust
//! use domain::{FilterCondition, FilterOperator};
//! use serde_json::json;
//!
//! let active = FilterCondition::eq("status", "active");
//! let adults = FilterCondition::new("age", FilterOperator::GreaterThanOrEqual, json!(18));
//! let parsed = FilterCondition::parse("id", "!=", serde_json::Value::Null).unwrap();
//! assert_eq!(parsed, FilterCondition::default());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::ID_FIELD;
use crate::error::DomainError;

/// Comparison operators for filter conditions
///
/// Comparing against `null` with `=` / `!=` means IS NULL / IS NOT NULL.
/// Serialized as its `Display` form and parsed like [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Not equal to (!=)
    NotEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal to (<=)
    LessThanOrEqual,
    /// Pattern matching with `%` and `_` wildcards (LIKE)
    Like,
    /// Value is in a list (IN)
    In,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "!="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
            Self::In => write!(f, "IN"),
        }
    }
}

impl FromStr for FilterOperator {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" => Ok(Self::Equal),
            "!=" | "<>" => Ok(Self::NotEqual),
            ">" => Ok(Self::GreaterThan),
            ">=" => Ok(Self::GreaterThanOrEqual),
            "<" => Ok(Self::LessThan),
            "<=" => Ok(Self::LessThanOrEqual),
            "like" => Ok(Self::Like),
            "in" => Ok(Self::In),
            _ => Err(DomainError::UnsupportedOperator(s.to_string())),
        }
    }
}

impl TryFrom<String> for FilterOperator {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FilterOperator> for String {
    fn from(op: FilterOperator) -> Self {
        op.to_string()
    }
}

/// A single `field operator value` condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// The field name to filter on
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: Value,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Build a condition from a textual operator such as `"!="`
    pub fn parse(
        field: impl Into<String>,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<Self, DomainError> {
        Ok(Self::new(field, operator.parse()?, value))
    }

    /// Create an equality filter (field = value)
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Equal, value)
    }

    /// Create a not-equal filter (field != value)
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::NotEqual, value)
    }

    /// Check if the condition is a null test (IS NULL / IS NOT NULL)
    pub fn is_null_check(&self) -> bool {
        self.value.is_null() && matches!(self.operator, FilterOperator::Equal | FilterOperator::NotEqual)
    }
}

/// Matches every record that has an identifier (`id != null`)
impl Default for FilterCondition {
    fn default() -> Self {
        Self::ne(ID_FIELD, Value::Null)
    }
}
