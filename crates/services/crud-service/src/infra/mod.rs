//! Infrastructure layer - storage back-ends.

mod memory;
mod sea_orm_store;

pub use memory::MemoryStore;
pub use sea_orm_store::{Field, FieldKind, FieldMap, SeaOrmStore};
