//! Domain layer - Records, queries and pagination values.
//!
//! This crate contains the pure data model of the CRUD contract with no
//! infrastructure dependencies. Storage back-ends and services share it.

pub mod constants;
pub mod error;
pub mod fields;
pub mod filter;
pub mod page;
pub mod record;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use fields::FieldSelection;
pub use filter::{FilterCondition, FilterOperator};
pub use page::{PageRequest, PageResult, PerPage};
pub use record::{Attributes, Record, RecordId};
