//! Service layer - CRUD use cases over any record store.

mod crud_service;
mod options;

pub use crud_service::{CrudManager, CrudService};
pub use options::ListOptions;
