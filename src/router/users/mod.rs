//! Users-related HTTP API.
pub mod create;
pub mod deactivate;
pub mod delete;
pub mod list;
pub mod update;

use axum::Router;
use axum::routing::{get, patch};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::user::Profile;

/// Attributes a caller may set on a user.
#[derive(Debug, Validate, Serialize, Deserialize)]
pub struct ProfileBody {
    #[validate(length(min = 1, max = 255, message = "Full name must be 1 to 255 characters long."))]
    pub full_name: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(min = 1, max = 255, message = "Nationality must be 1 to 255 characters long."))]
    pub nationality: String,
}

impl From<ProfileBody> for Profile {
    fn from(body: ProfileBody) -> Self {
        Profile {
            full_name: body.full_name,
            email: body.email,
            nationality: body.nationality,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /users` goes to `list`, `POST /users` to `create`.
        .route("/users", get(list::handler).post(create::handler))
        .route("/users/", get(list::handler))
        // `PATCH /users/{username}` goes to `update`.
        // `DELETE /users/{username}` goes to `delete`.
        .route(
            "/users/{username}",
            patch(update::handler).delete(delete::handler),
        )
        // `PATCH /users/deactivate/{username}` goes to `deactivate`.
        .route("/users/deactivate/{username}", patch(deactivate::handler))
}
