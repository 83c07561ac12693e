//! Update user data.

use axum::Json;
use axum::extract::{Path, State};

use super::ProfileBody;
use crate::error::Result;
use crate::router::{Message, Valid};
use crate::user::UserRepository;

pub async fn handler(
    State(users): State<UserRepository>,
    Path(username): Path<String>,
    Valid(body): Valid<ProfileBody>,
) -> Result<Json<Message>> {
    users.update(&username, body.into()).await?;
    Ok(Message::new("User updated successfully"))
}
