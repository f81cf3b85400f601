pub use crate::auth::repo_types::User;
use crate::error::AppError;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, last_login";

impl User {
    /// Find a user whose username or email equals `login` exactly.
    pub async fn find_by_login(db: &SqlitePool, login: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = ?1 OR email = ?1
            ORDER BY username = ?1 DESC
            LIMIT 1
            "#
        ))
        .bind(login)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn username_taken(db: &SqlitePool, username: &str) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(db)
            .await?;
        Ok(found.is_some())
    }

    pub async fn email_taken(db: &SqlitePool, email: &str) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(found.is_some())
    }

    /// Insert a new user. A UNIQUE violation on username or email becomes
    /// `AppError::Conflict`, so racing registrations cannot both succeed.
    pub async fn create(
        db: &SqlitePool,
        username: &str,
        email: &str,
        password_hash: &str,
        created_at: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(created_at)
        .fetch_one(db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Username or email already exists".into())
            }
            other => AppError::Storage(other),
        })?;
        Ok(user)
    }

    pub async fn touch_last_login(db: &SqlitePool, id: i64, at: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = ?1 WHERE id = ?2")
            .bind(at)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    const TS: &str = "2024-06-01T12:00:00Z";

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let state = AppState::fake("games").await;
        User::create(&state.db, "alice", "a@x.com", "h", TS).await.unwrap();

        let err = User::create(&state.db, "alice", "other@x.com", "h", TS)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = User::create(&state.db, "bob", "a@x.com", "h", TS)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn finds_by_username_or_email_case_sensitively() {
        let state = AppState::fake("games").await;
        let created = User::create(&state.db, "alice", "a@x.com", "h", TS).await.unwrap();
        assert!(created.last_login.is_none());

        let by_name = User::find_by_login(&state.db, "alice").await.unwrap().unwrap();
        let by_email = User::find_by_login(&state.db, "a@x.com").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_email.id, created.id);
        assert!(User::find_by_login(&state.db, "Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn touch_last_login_updates_row() {
        let state = AppState::fake("games").await;
        let created = User::create(&state.db, "alice", "a@x.com", "h", TS).await.unwrap();
        User::touch_last_login(&state.db, created.id, "2024-06-02T08:30:00Z")
            .await
            .unwrap();
        let user = User::find_by_id(&state.db, created.id).await.unwrap().unwrap();
        assert_eq!(user.last_login.as_deref(), Some("2024-06-02T08:30:00Z"));
        assert!(User::username_taken(&state.db, "alice").await.unwrap());
        assert!(!User::email_taken(&state.db, "b@y.com").await.unwrap());
    }
}
