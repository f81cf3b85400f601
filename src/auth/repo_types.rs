use sqlx::FromRow;

/// User record in the database. Timestamps are stored as RFC 3339 text.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub last_login: Option<String>,
}
