use std::collections::HashMap;
use std::sync::RwLock;

use axum::async_trait;

use super::SessionData;

/// Server-side session storage keyed by the opaque token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, token: &str) -> anyhow::Result<Option<SessionData>>;
    async fn set(&self, token: &str, data: SessionData) -> anyhow::Result<()>;
    /// Removing an unknown token is not an error.
    async fn clear(&self, token: &str) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, token: &str) -> anyhow::Result<Option<SessionData>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        Ok(sessions.get(token).cloned())
    }

    async fn set(&self, token: &str, data: SessionData) -> anyhow::Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        sessions.insert(token.to_string(), data);
        Ok(())
    }

    async fn clear(&self, token: &str) -> anyhow::Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        sessions.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FlashLevel;

    #[tokio::test]
    async fn set_get_clear() {
        let store = MemorySessionStore::new();
        assert!(store.get("t1").await.unwrap().is_none());

        store.set("t1", SessionData::for_user(7, "alice")).await.unwrap();
        let data = store.get("t1").await.unwrap().expect("stored");
        assert_eq!(data.user.unwrap().username, "alice");

        store.clear("t1").await.unwrap();
        assert!(store.get("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = MemorySessionStore::new();
        store.clear("missing").await.unwrap();
        store.clear("missing").await.unwrap();
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = MemorySessionStore::new();
        let mut data = SessionData::default();
        data.flash(FlashLevel::Info, "hello");
        store.set("t", data).await.unwrap();
        store.set("t", SessionData::default()).await.unwrap();
        assert!(store.get("t").await.unwrap().unwrap().flashes.is_empty());
    }
}
