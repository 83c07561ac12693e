//! Create a user.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ProfileBody;
use crate::error::Result;
use crate::router::Valid;
use crate::user::{User, UserRepository};

#[derive(Debug, Validate, Serialize, Deserialize)]
pub struct Body {
    #[validate(length(min = 1, max = 255, message = "Username must be 1 to 255 characters long."))]
    pub username: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: ProfileBody,
}

/// Handler to create user.
pub async fn handler(
    State(users): State<UserRepository>,
    Valid(body): Valid<Body>,
) -> Result<Json<User>> {
    let user = users.create(&body.username, body.profile.into()).await?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;

    use crate::user::User;
    use crate::*;

    fn body(username: &str, email: &str) -> String {
        json!({
            "full_name": "John Doe",
            "username": username,
            "email": email,
            "nationality": "Testland",
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_create_handler() {
        let app = app(router::state());

        let response = make_request(
            app,
            Method::POST,
            "/v1/users",
            body("john_doe", "john.doe@test-case.com"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let user: User = serde_json::from_slice(&body).unwrap();
        assert_eq!(user.username, "john_doe");
        assert_eq!(user.email, "john.doe@test-case.com");
        assert!(user.is_active);
        assert_eq!(user.created_at, user.modified_at);
        assert!(!user.id.is_empty());
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let app = app(router::state());
        router::create_user(app.clone(), "john_doe").await;

        // Same username.
        let response = make_request(
            app.clone(),
            Method::POST,
            "/v1/users",
            body("john_doe", "other@test-case.com"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Same email.
        let response = make_request(
            app,
            Method::POST,
            "/v1/users",
            body("other", "john_doe@test-case.com"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_with_invalid_email() {
        let app = app(router::state());

        let response = make_request(
            app,
            Method::POST,
            "/v1/users",
            body("john_doe", "not-an-email"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["errors"][0]["field"], "email");
        assert_eq!(body["errors"][0]["message"], "Email must be formatted.");
    }

    #[tokio::test]
    async fn test_create_with_empty_nationality() {
        let app = app(router::state());

        let body = json!({
            "full_name": "John Doe",
            "username": "john_doe",
            "email": "john.doe@test-case.com",
            "nationality": "",
        });
        let response =
            make_request(app, Method::POST, "/v1/users", body.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["errors"][0]["field"], "nationality");
        assert_eq!(
            body["errors"][0]["message"],
            "Nationality must be 1 to 255 characters long."
        );
    }

    #[tokio::test]
    async fn test_create_with_missing_field() {
        let app = app(router::state());

        let response = make_request(
            app,
            Method::POST,
            "/v1/users",
            json!({ "username": "john_doe" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
