//! Typed builder for User.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::user::User;

/// [`User`] builder.
#[derive(Debug, Clone)]
pub struct UserBuilder<Username, Email> {
    username: Username,
    email: Email,
    full_name: String,
    nationality: String,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            username: Missing,
            email: Missing,
            full_name: String::default(),
            nationality: String::default(),
        }
    }
}

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Email> UserBuilder<Missing, Email> {
    /// Update `username` field on [`UserBuilder`].
    pub fn username(
        self,
        username: impl Into<String>,
    ) -> UserBuilder<Present<String>, Email> {
        UserBuilder {
            username: Present(username.into()),
            email: self.email,
            full_name: self.full_name,
            nationality: self.nationality,
        }
    }
}

impl<Username> UserBuilder<Username, Missing> {
    /// Update `email` field on [`UserBuilder`].
    pub fn email(
        self,
        email: impl Into<String>,
    ) -> UserBuilder<Username, Present<String>> {
        UserBuilder {
            username: self.username,
            email: Present(email.into()),
            full_name: self.full_name,
            nationality: self.nationality,
        }
    }
}

impl<Username, Email> UserBuilder<Username, Email> {
    /// Update `full_name` field on [`UserBuilder`].
    pub fn full_name(mut self, full_name: impl ToString) -> Self {
        self.full_name = full_name.to_string();
        self
    }

    /// Update `nationality` field on [`UserBuilder`].
    pub fn nationality(mut self, nationality: impl ToString) -> Self {
        self.nationality = nationality.to_string();
        self
    }
}

impl UserBuilder<Present<String>, Present<String>> {
    /// Build an active [`User`] with a fresh id, created at `now`.
    pub fn build(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            full_name: self.full_name,
            username: self.username.0,
            email: self.email.0,
            nationality: self.nationality,
            is_active: true,
            created_at: now,
            modified_at: now,
        }
    }
}

impl User {
    /// Create a new [`UserBuilder`].
    pub fn builder() -> UserBuilder<Missing, Missing> {
        UserBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sets_lifecycle_fields() {
        let now = Utc::now();
        let user = User::builder()
            .username("john_doe")
            .email("john.doe@example.com")
            .full_name("John Doe")
            .nationality("Testland")
            .build(now);

        assert!(Uuid::parse_str(&user.id).is_ok());
        assert!(user.is_active);
        assert_eq!(user.created_at, now);
        assert_eq!(user.modified_at, now);
        assert_eq!(user.username, "john_doe");
        assert_eq!(user.full_name, "John Doe");
    }

    #[test]
    fn test_ids_are_unique() {
        let now = Utc::now();
        let first = User::builder().username("a").email("a@b.c").build(now);
        let second = User::builder().username("a").email("a@b.c").build(now);

        assert_ne!(first.id, second.id);
    }
}
