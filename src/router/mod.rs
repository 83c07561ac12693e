//! HTTP API, mounted under `/v1`.
pub mod ping;
pub mod users;

use axum::Router;
use axum::extract::{FromRequest, Json, Request};
use axum::routing::{delete, options};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{AppState, ServerError};

/// JSON body checked with [`Validate`] before reaching the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Confirmation returned by mutating routes.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_owned(),
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        // `OPTIONS /ping` goes to `ping`.
        .route("/ping", options(ping::handler))
        // `DELETE /delete/{id}` goes to `delete::by_id`.
        .route("/delete/{id}", delete(users::delete::by_id))
        .merge(users::router())
}

/// State over an empty in-memory store.
#[cfg(test)]
pub fn state() -> crate::AppState {
    let start = "2024-05-01T10:00:00Z"
        .parse::<chrono::DateTime<chrono::Utc>>()
        .unwrap();

    crate::AppState {
        db: crate::database::Database::memory(),
        clock: std::sync::Arc::new(crate::clock::TickingClock::new(start)),
    }
}

/// Create a user through the API.
#[cfg(test)]
pub async fn create_user(app: Router, username: &str) -> crate::user::User {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;

    let body = serde_json::json!({
        "full_name": "John Doe",
        "username": username,
        "email": format!("{username}@test-case.com"),
        "nationality": "Testland",
    });
    let response =
        crate::make_request(app, Method::POST, "/v1/users", body.to_string()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
