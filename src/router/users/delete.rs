//! Delete user from the record store.

use axum::Json;
use axum::extract::{Path, State};

use crate::error::Result;
use crate::router::Message;
use crate::user::UserRepository;

const DELETED: &str = "User deleted successfully";

/// Delete by username.
pub async fn handler(
    State(users): State<UserRepository>,
    Path(username): Path<String>,
) -> Result<Json<Message>> {
    users.delete_by_username(&username).await?;
    Ok(Message::new(DELETED))
}

/// Delete by record id.
pub async fn by_id(
    State(users): State<UserRepository>,
    Path(id): Path<String>,
) -> Result<Json<Message>> {
    users.delete_by_id(&id).await?;
    Ok(Message::new(DELETED))
}
