//! Book catalog: record types, storage and operations

pub mod catalog;
pub mod store;
pub mod types;

pub use catalog::Catalog;
pub use store::{BookStore, JsonFileStore, MemoryStore};
pub use types::{Book, BookList, SortOrder};
