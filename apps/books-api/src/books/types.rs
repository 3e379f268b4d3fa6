//! Book record types

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields every new book must carry, in the order they are reported
pub const REQUIRED_FIELDS: [&str; 4] = ["title", "author", "genre", "price"];

/// Fields an update is allowed to overwrite
pub const UPDATABLE_FIELDS: [&str; 4] = REQUIRED_FIELDS;

/// A single book record.
///
/// Records are open-ended: besides the known keys (`id`, `title`, `author`,
/// `genre`, `price`) any caller-supplied field is kept as-is, in its
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Book(Map<String, Value>);

impl Book {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// The record id, if it holds an integer
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Whether the stored id equals `id`. A whole float such as `3.0` matches
    /// `3`; strings and fractional numbers never match.
    pub fn has_id(&self, id: i64) -> bool {
        match self.0.get("id") {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(stored) => stored == id,
                None => n
                    .as_f64()
                    .is_some_and(|f| f.fract() == 0.0 && f == id as f64 && f as i64 == id),
            },
            _ => false,
        }
    }

    pub fn set_id(&mut self, id: i64) {
        self.0.insert("id".to_string(), Value::from(id));
    }

    /// Lower-cased title used for ordering. Missing or non-string titles
    /// order as the empty string.
    pub fn sort_key(&self) -> String {
        self.0
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_lowercase)
            .unwrap_or_default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }
}

/// Title ordering requested by a list call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!(
                "Invalid sorting value {:?}: expected \"asc\" or \"desc\"",
                other
            )),
        }
    }
}

impl SortOrder {
    /// Parse the optional `sorting` query value. An empty value means no
    /// sorting.
    pub fn parse_param(raw: Option<&str>) -> Result<Option<Self>, String> {
        match raw {
            None | Some("") => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }
}

/// Result of a list call
#[derive(Debug, Clone, Serialize)]
pub struct BookList {
    pub books: Vec<Book>,
    pub total: usize,
}
