//! Domain-level constants.
//!
//! These constants define the defaults of the CRUD contract.

// =============================================================================
// Records
// =============================================================================

/// Attribute holding a record's unique identifier
pub const ID_FIELD: &str = "id";

// =============================================================================
// Pagination
// =============================================================================

/// Default starting page number (1-indexed)
pub const DEFAULT_PAGE_NUMBER: i64 = 1;

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// `per_page` value that disables pagination and returns every match
pub const FETCH_ALL: i64 = -1;
