//! In-memory record store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Filter, Result, Store, StoreError};
use crate::user::{User, UserChanges};

/// Table kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, User>>,
}

fn matches(filter: &Filter, user: &User) -> Result<bool> {
    match serde_json::to_value(user)? {
        Value::Object(item) => Ok(filter.matches(&item)),
        _ => Ok(false),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn scan(&self, filter: Option<&Filter>) -> Result<Vec<User>> {
        let records = self.records.read().await;

        let mut users = Vec::with_capacity(records.len());
        for user in records.values() {
            if let Some(filter) = filter {
                if !matches(filter, user)? {
                    continue;
                }
            }
            users.push(user.clone());
        }

        Ok(users)
    }

    async fn get(&self, id: &str) -> Result<Option<User>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn put(&self, user: &User) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&user.id) {
            return Err(StoreError::AlreadyExists(user.id.clone()));
        }

        records.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<bool> {
        match self.records.write().await.get_mut(id) {
            Some(user) => {
                changes.apply(user);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.records.write().await.remove(id).is_some())
    }
}
