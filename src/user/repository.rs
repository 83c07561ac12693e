//! User operations over the record store.
//!
//! Username-addressed operations scan the table for the username first, then
//! act on the key of the first match. Neither the uniqueness check of
//! [`UserRepository::create`] nor these lookups are atomic with the write that
//! follows.

use std::sync::Arc;

use axum::extract::FromRef;
use serde_json::{Map, Value};

use crate::AppState;
use crate::clock::Clock;
use crate::database::{Filter, Store};
use crate::error::{Result, ServerError};
use crate::user::{User, UserChanges};

/// Caller-supplied user attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub full_name: String,
    pub email: String,
    pub nationality: String,
}

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for UserRepository {
    fn from_ref(state: &AppState) -> UserRepository {
        UserRepository::new(Arc::clone(&state.db.store), Arc::clone(&state.clock))
    }
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Insert a new user, rejecting taken usernames and emails.
    pub async fn create(&self, username: &str, profile: Profile) -> Result<User> {
        let taken = Filter::Any(vec![
            Filter::eq("username", username),
            Filter::eq("email", profile.email.as_str()),
        ]);
        if !self.store.scan(Some(&taken)).await?.is_empty() {
            return Err(ServerError::Conflict);
        }

        let user = User::builder()
            .username(username)
            .email(profile.email)
            .full_name(profile.full_name)
            .nationality(profile.nationality)
            .build(self.clock.now());
        self.store.put(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Replace `full_name`, `email` and `nationality` of a user.
    pub async fn update(&self, username: &str, profile: Profile) -> Result<()> {
        let user = self.find_by_username(username).await?;

        let owners = self
            .store
            .scan(Some(&Filter::eq("email", profile.email.as_str())))
            .await?;
        if owners.iter().any(|owner| owner.id != user.id) {
            return Err(ServerError::Conflict);
        }

        let changes = UserChanges {
            full_name: Some(profile.full_name),
            email: Some(profile.email),
            nationality: Some(profile.nationality),
            ..UserChanges::at(self.clock.now())
        };
        self.apply(&user.id, &changes).await?;

        tracing::info!(user_id = %user.id, %username, "user updated");
        Ok(())
    }

    /// Mark a user as inactive.
    pub async fn deactivate(&self, username: &str) -> Result<()> {
        let user = self.find_by_username(username).await?;

        let changes = UserChanges {
            is_active: Some(false),
            ..UserChanges::at(self.clock.now())
        };
        self.apply(&user.id, &changes).await?;

        tracing::info!(user_id = %user.id, %username, "user deactivated");
        Ok(())
    }

    /// List users, optionally filtered and projected on `fields`.
    ///
    /// Requested fields a record does not have are omitted.
    pub async fn list(
        &self,
        filter: Option<&Filter>,
        fields: Option<&[String]>,
    ) -> Result<Vec<Map<String, Value>>> {
        let users = self.store.scan(filter).await?;

        let mut items = Vec::with_capacity(users.len());
        for user in users {
            let Value::Object(item) = serde_json::to_value(user)
                .map_err(crate::database::StoreError::from)?
            else {
                continue;
            };

            items.push(match fields {
                Some(fields) => fields
                    .iter()
                    .filter_map(|field| {
                        item.get(field).map(|value| (field.clone(), value.clone()))
                    })
                    .collect(),
                None => item,
            });
        }

        Ok(items)
    }

    /// Delete the user owning `username`.
    pub async fn delete_by_username(&self, username: &str) -> Result<()> {
        let user = self.find_by_username(username).await?;
        self.delete_by_id(&user.id).await
    }

    /// Delete a user by key.
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(ServerError::UserNotFound);
        }

        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// First user whose `username` matches.
    pub async fn find_by_username(&self, username: &str) -> Result<User> {
        self.store
            .scan(Some(&Filter::eq("username", username)))
            .await?
            .into_iter()
            .next()
            .ok_or(ServerError::UserNotFound)
    }

    async fn apply(&self, id: &str, changes: &UserChanges) -> Result<()> {
        // Deleted between the scan and the update.
        if !self.store.update(id, changes).await? {
            return Err(ServerError::UserNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::clock::TickingClock;
    use crate::database::memory::MemoryStore;

    fn repository() -> UserRepository {
        let start = "2024-05-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        UserRepository::new(
            Arc::new(MemoryStore::default()),
            Arc::new(TickingClock::new(start)),
        )
    }

    fn profile(email: &str) -> Profile {
        Profile {
            full_name: "John Doe".into(),
            email: email.into(),
            nationality: "Testland".into(),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let users = repository();
        users.create("john", profile("john@example.com")).await.unwrap();

        assert!(matches!(
            users.create("john", profile("other@example.com")).await,
            Err(ServerError::Conflict)
        ));
        assert!(matches!(
            users.create("other", profile("john@example.com")).await,
            Err(ServerError::Conflict)
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_profile() {
        let users = repository();
        let created = users.create("john", profile("john@example.com")).await.unwrap();

        let new_profile = Profile {
            full_name: "Johnny Doe".into(),
            email: "johnny@example.com".into(),
            nationality: "Elsewhere".into(),
        };
        users.update("john", new_profile.clone()).await.unwrap();

        let updated = users.find_by_username("john").await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.full_name, new_profile.full_name);
        assert_eq!(updated.email, new_profile.email);
        assert_eq!(updated.nationality, new_profile.nationality);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.modified_at > created.modified_at);
    }

    #[tokio::test]
    async fn test_update_keeps_email_unique() {
        let users = repository();
        users.create("john", profile("john@example.com")).await.unwrap();
        users.create("jane", profile("jane@example.com")).await.unwrap();

        assert!(matches!(
            users.update("jane", profile("john@example.com")).await,
            Err(ServerError::Conflict)
        ));
        // Keeping its own email is fine.
        users.update("jane", profile("jane@example.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_deactivate() {
        let users = repository();
        users.create("john", profile("john@example.com")).await.unwrap();
        users.deactivate("john").await.unwrap();

        let john = users.find_by_username("john").await.unwrap();
        assert!(!john.is_active);
        assert!(john.modified_at > john.created_at);

        assert!(matches!(
            users.deactivate("ghost").await,
            Err(ServerError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_projects_fields() {
        let users = repository();
        users.create("john", profile("john@example.com")).await.unwrap();
        users.create("jane", profile("jane@example.com")).await.unwrap();

        let fields = vec!["username".to_owned(), "unknown".to_owned()];
        let items = users
            .list(Some(&Filter::eq("username", "jane")), Some(fields.as_slice()))
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].len(), 1);
        assert_eq!(items[0]["username"], "jane");
    }

    #[tokio::test]
    async fn test_delete() {
        let users = repository();
        let john = users.create("john", profile("john@example.com")).await.unwrap();
        users.create("jane", profile("jane@example.com")).await.unwrap();

        users.delete_by_username("jane").await.unwrap();
        assert!(matches!(
            users.delete_by_username("jane").await,
            Err(ServerError::UserNotFound)
        ));

        users.delete_by_id(&john.id).await.unwrap();
        assert!(matches!(
            users.delete_by_id(&john.id).await,
            Err(ServerError::UserNotFound)
        ));

        assert!(users.list(None, None).await.unwrap().is_empty());
    }
}
