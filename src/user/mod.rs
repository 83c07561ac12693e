mod builder;
mod repository;

pub use builder::*;
pub use repository::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attributes holding a boolean, as opposed to strings.
pub const BOOLEAN_FIELDS: &[&str] = &["is_active"];

/// User as saved on the record store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub nationality: String,
    #[serde(default = "active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

fn active() -> bool {
    true
}

/// Partial update of a stored [`User`].
///
/// `None` fields are left untouched, `modified_at` is always written.
#[derive(Clone, Debug, PartialEq)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub nationality: Option<String>,
    pub is_active: Option<bool>,
    pub modified_at: DateTime<Utc>,
}

impl UserChanges {
    /// Changes touching nothing but `modified_at`.
    pub fn at(modified_at: DateTime<Utc>) -> Self {
        Self {
            full_name: None,
            email: None,
            nationality: None,
            is_active: None,
            modified_at,
        }
    }

    /// Apply changes on `user`.
    pub fn apply(&self, user: &mut User) {
        if let Some(full_name) = &self.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(nationality) = &self.nationality {
            user.nationality = nationality.clone();
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        user.modified_at = self.modified_at;
    }
}
