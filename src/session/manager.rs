//! Session manager — owns the live sessions and their lifecycle.
//!
//! Each conversation gets its own [`ChatSession`] under a generated id.
//! Sessions that go idle past a caller-chosen TTL are evicted with a full
//! backend shutdown, so abandoned conversations do not leak child processes.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;
use uuid::Uuid;

use super::chat::ChatSession;

struct ManagedSession {
    session: ChatSession,
    last_active: Instant,
}

/// Registry of live sessions keyed by generated id.
#[derive(Default)]
pub struct SessionManager {
    sessions: HashMap<String, ManagedSession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its generated id.
    pub fn insert(&mut self, session: ChatSession) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(
            id.clone(),
            ManagedSession {
                session,
                last_active: Instant::now(),
            },
        );
        tracing::info!(session_id = %id, "session registered");
        id
    }

    /// Look up a session by id, marking it active.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        let managed = self.sessions.get_mut(id)?;
        managed.last_active = Instant::now();
        Some(&mut managed.session)
    }

    /// Remove a session, shutting its backends down first.
    pub async fn remove(&mut self, id: &str) -> bool {
        let Some(mut managed) = self.sessions.remove(id) else {
            return false;
        };
        managed.session.shutdown().await;
        tracing::info!(session_id = %id, "session removed");
        true
    }

    /// Evict every session idle longer than `ttl`, shutting them down
    /// concurrently. Returns the number evicted.
    pub async fn evict_idle(&mut self, ttl: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, m)| now.duration_since(m.last_active) >= ttl)
            .map(|(id, _)| id.clone())
            .collect();

        let mut evicted: Vec<ManagedSession> = expired
            .iter()
            .filter_map(|id| self.sessions.remove(id))
            .collect();

        join_all(evicted.iter_mut().map(|m| m.session.shutdown())).await;

        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "evicted idle sessions");
        }
        evicted.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
