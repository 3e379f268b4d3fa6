//! Book catalog operations
//!
//! Every operation works on a fresh snapshot of the collection loaded from
//! the store. Mutations run a full read-modify-write cycle while holding the
//! catalog write lock, so writers in this process never overwrite each
//! other's changes.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::store::BookStore;
use super::types::{Book, BookList, SortOrder, REQUIRED_FIELDS, UPDATABLE_FIELDS};
use crate::error::{AppError, Result, StorageError};

/// Book catalog backed by a [`BookStore`]
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn BookStore>,
    write_lock: Arc<Mutex<()>>,
}

impl Catalog {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// List every book, optionally ordered by case-insensitive title
    pub async fn list(&self, order: Option<SortOrder>) -> Result<BookList> {
        let mut books = self.store.load().await?;

        match order {
            Some(SortOrder::Asc) => books.sort_by_cached_key(Book::sort_key),
            Some(SortOrder::Desc) => {
                books.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
            }
            None => {}
        }

        let total = books.len();
        Ok(BookList { books, total })
    }

    /// Get a single book by id
    pub async fn get(&self, id: i64) -> Result<Book> {
        self.store
            .load()
            .await?
            .into_iter()
            .find(|book| book.has_id(id))
            .ok_or_else(|| AppError::NotFound(format!("Book with id={} not found", id)))
    }

    /// Validate and store a new book, assigning the next free id
    pub async fn create(&self, fields: Map<String, Value>) -> Result<Book> {
        let mut book = Book::new(fields);
        validate_new_book(&book)?;

        let _guard = self.write_lock.lock().await;
        let mut books = self.store.load().await?;

        let id = next_id(&books)?;
        book.set_id(id);
        books.push(book.clone());
        self.store.save(&books).await?;

        tracing::info!(book_id = id, "Book created");
        Ok(book)
    }

    /// Overwrite the updatable fields present in `changes`. Other fields in
    /// `changes` are ignored.
    pub async fn update(&self, id: i64, changes: &Map<String, Value>) -> Result<Book> {
        let _guard = self.write_lock.lock().await;
        let mut books = self.store.load().await?;

        let book = books
            .iter_mut()
            .find(|book| book.has_id(id))
            .ok_or_else(|| AppError::NotFound(format!("Book with id={} not found", id)))?;

        for field in UPDATABLE_FIELDS {
            if let Some(value) = changes.get(field) {
                book.set(field, value.clone());
            }
        }
        let updated = book.clone();

        self.store.save(&books).await?;

        tracing::info!(book_id = id, "Book updated");
        Ok(updated)
    }

    /// Remove every book carrying `id`
    pub async fn delete(&self, id: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut books = self.store.load().await?;

        let before = books.len();
        books.retain(|book| !book.has_id(id));
        if books.len() == before {
            return Err(AppError::NotFound(format!("Book with id={} not found", id)));
        }

        self.store.save(&books).await?;

        tracing::info!(book_id = id, removed = before - books.len(), "Book deleted");
        Ok(())
    }
}

fn validate_new_book(book: &Book) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_FIELDS
        .into_iter()
        .filter(|field| !book.contains(field))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    // JSON booleans are rejected here although some runtimes count them as
    // integers.
    if !matches!(book.get("price"), Some(Value::Number(_))) {
        return Err(AppError::Validation(
            "Field price must be a number".to_string(),
        ));
    }

    Ok(())
}

/// Next id: one past the largest integer id, or 1 for an empty collection
fn next_id(books: &[Book]) -> Result<i64> {
    books
        .iter()
        .filter_map(Book::id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| StorageError::Format("id space exhausted".to_string()).into())
}
