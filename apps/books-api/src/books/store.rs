//! Collection store
//!
//! The whole collection is read and written in one piece. [`BookStore`] is
//! the storage boundary handed to the catalog; [`JsonFileStore`] backs the
//! server and [`MemoryStore`] backs tests.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::RwLock;

use super::types::Book;
use crate::error::StorageError;

/// Whole-collection storage backend
#[async_trait::async_trait]
pub trait BookStore: Send + Sync {
    /// Load every record, in stored order. A store that has never been
    /// written to holds an empty collection.
    async fn load(&self) -> Result<Vec<Book>, StorageError>;

    /// Replace the stored collection with `books`
    async fn save(&self, books: &[Book]) -> Result<(), StorageError>;
}

// ============================================================================
// JSON file store
// ============================================================================

/// Collection stored as a pretty-printed JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "books.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait::async_trait]
impl BookStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Book>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        decode_collection(&bytes)
    }

    async fn save(&self, books: &[Book]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        let encoded = serde_json::to_vec_pretty(books)?;

        // Write beside the target and rename over it so readers never see a
        // half-written file.
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &encoded)
            .await
            .map_err(|e| self.write_error(e))?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(self.write_error(e));
        }

        tracing::debug!(
            path = %self.path.display(),
            count = books.len(),
            bytes = encoded.len(),
            "Saved books file"
        );

        Ok(())
    }
}

/// Decode a stored collection. The top level must be an array of objects.
fn decode_collection(bytes: &[u8]) -> Result<Vec<Book>, StorageError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| StorageError::Format(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(StorageError::Format(
            "top level of the books file must be an array".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(Book::new(fields)),
            _ => Err(StorageError::Format(format!(
                "entry {} of the books file is not an object",
                index
            ))),
        })
        .collect()
}

// ============================================================================
// In-memory store
// ============================================================================

/// Collection held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    books: RwLock<Vec<Book>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            books: RwLock::new(books),
        }
    }
}

#[async_trait::async_trait]
impl BookStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Book>, StorageError> {
        Ok(self.books.read().await.clone())
    }

    async fn save(&self, books: &[Book]) -> Result<(), StorageError> {
        *self.books.write().await = books.to_vec();
        Ok(())
    }
}
