//! Deactivate a user without deleting it.

use axum::Json;
use axum::extract::{Path, State};

use crate::error::Result;
use crate::router::Message;
use crate::user::UserRepository;

pub async fn handler(
    State(users): State<UserRepository>,
    Path(username): Path<String>,
) -> Result<Json<Message>> {
    users.deactivate(&username).await?;
    Ok(Message::new("User deactivated successfully"))
}
