//! Record store abstraction.
//!
//! Every user operation is expressed through [`Store`], a narrow key-value
//! interface (scan with filter, get, put, update, delete by key). Backends are
//! selected from the `store` section of `config.yaml`.
pub mod dynamodb;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{Backend, StoreConfig};
use crate::user::{BOOLEAN_FIELDS, User, UserChanges};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors reported by a record store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record `{0}` already exists")]
    AlreadyExists(String),

    #[error("record cannot be converted: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

/// Filter string is not `key:value`.
#[derive(Debug, Error)]
#[error("Invalid filter format. Use 'key:value'.")]
pub struct InvalidFilter;

/// Attribute filter applied while scanning.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Attribute `field` equals `value`.
    Eq { field: String, value: Value },
    /// At least one of the filters matches.
    Any(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Parse a `key:value` query filter.
    ///
    /// Returns `None` when the key or the value is empty.
    pub fn parse(raw: &str) -> std::result::Result<Option<Self>, InvalidFilter> {
        let mut parts = raw.split(':');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(InvalidFilter);
        };

        if key.is_empty() || value.is_empty() {
            return Ok(None);
        }

        if BOOLEAN_FIELDS.contains(&key) {
            let value = value.parse::<bool>().map_err(|_| InvalidFilter)?;
            Ok(Some(Filter::eq(key, value)))
        } else {
            Ok(Some(Filter::eq(key, value)))
        }
    }

    /// Whether a JSON record satisfies the filter.
    pub fn matches(&self, item: &Map<String, Value>) -> bool {
        match self {
            Filter::Eq { field, value } => item.get(field) == Some(value),
            Filter::Any(filters) => filters.iter().any(|filter| filter.matches(item)),
        }
    }
}

/// Key-value table holding [`User`] records, keyed by `id`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read every record matching `filter`, or the whole table.
    async fn scan(&self, filter: Option<&Filter>) -> Result<Vec<User>>;

    /// Find a record by key.
    async fn get(&self, id: &str) -> Result<Option<User>>;

    /// Insert a new record. Fails if the key is already taken.
    async fn put(&self, user: &User) -> Result<()>;

    /// Update an existing record. Returns `false` if no record has this key.
    async fn update(&self, id: &str, changes: &UserChanges) -> Result<bool>;

    /// Delete a record. Returns `false` if no record has this key.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Custom db structure to pass to Axum.
#[derive(Clone)]
pub struct Database {
    pub store: Arc<dyn Store>,
}

impl Database {
    /// Connect to the configured backend.
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        let store: Arc<dyn Store> = match config.backend {
            Backend::Memory => {
                tracing::warn!("records are kept in memory and lost on shutdown");
                Arc::new(memory::MemoryStore::default())
            },
            Backend::DynamoDb => Arc::new(dynamodb::DynamoDbStore::connect(config).await?),
        };

        Ok(Self { store })
    }

    /// In-memory database.
    pub fn memory() -> Self {
        Self {
            store: Arc::new(memory::MemoryStore::default()),
        }
    }
}
