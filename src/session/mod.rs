mod cookie;
mod store;

pub use cookie::{read_cookie, session_cookie};
pub use store::{MemorySessionStore, SessionStore};

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};

const TOKEN_LEN: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// User a session is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user: Option<SessionUser>,
    pub flashes: Vec<Flash>,
}

impl SessionData {
    pub fn for_user(id: i64, username: &str) -> Self {
        Self {
            user: Some(SessionUser {
                id,
                username: username.to_string(),
            }),
            flashes: Vec::new(),
        }
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.flashes.is_empty()
    }
}

/// A session as held by the server: the opaque token and its data.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub data: SessionData,
}

pub fn new_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_long_and_distinct() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn flashes_are_read_once() {
        let mut data = SessionData::default();
        assert!(data.is_empty());
        data.flash(FlashLevel::Error, "Game not found");
        assert!(!data.is_empty());
        let taken = data.take_flashes();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].message, "Game not found");
        assert!(data.take_flashes().is_empty());
    }
}
