use std::path::PathBuf;

use crate::auth::password::PasswordScheme;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub games_dir: PathBuf,
    pub session: SessionConfig,
    pub password_scheme: PasswordScheme,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://arcade.db".into());
        let games_dir = std::env::var("GAMES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("games"));
        let session = SessionConfig {
            cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "arcade_session".into()),
            secure: std::env::var("SESSION_COOKIE_SECURE")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(false),
        };
        let password_scheme = match std::env::var("PASSWORD_SCHEME") {
            Ok(v) => v.parse::<PasswordScheme>()?,
            Err(_) => PasswordScheme::default(),
        };
        Ok(Self {
            database_url,
            games_dir,
            session,
            password_scheme,
        })
    }
}
