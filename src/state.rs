use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::AppConfig;
use crate::session::{MemorySessionStore, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .context("parse DATABASE_URL")?
            .create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("connect to database")?;

        let sessions = Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>;

        Ok(Self::from_parts(db, config, sessions))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            db,
            config,
            sessions,
        }
    }

    /// In-memory database with migrations applied and an empty session store.
    #[cfg(test)]
    pub async fn fake(games_dir: impl Into<std::path::PathBuf>) -> Self {
        use crate::auth::password::PasswordScheme;
        use crate::config::SessionConfig;

        // A single, never-recycled connection keeps the in-memory database alive.
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("migrations apply");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            games_dir: games_dir.into(),
            session: SessionConfig {
                cookie_name: "arcade_session".into(),
                secure: false,
            },
            password_scheme: PasswordScheme::Sha256,
        });

        Self::from_parts(db, config, Arc::new(MemorySessionStore::new()))
    }
}
