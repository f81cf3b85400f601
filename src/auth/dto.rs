use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Form body for `POST /signup`. Missing fields arrive as empty strings.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Form body for `POST /login`. `username` may hold a username or an email.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Response of `GET /api/check-auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub username: String,
}

/// Public part of the user, without the credential.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

/// Data shown on the profile page.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub created_at: Option<OffsetDateTime>,
    pub last_login: Option<OffsetDateTime>,
}
