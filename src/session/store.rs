//! In-memory session registry.
//!
//! Sessions are keyed by an opaque id carried in a cookie and dropped after
//! an idle timeout or an explicit reset.

use chrono::{Duration, Local};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::state::SessionState;
use crate::config::AppConfig;

pub type SessionId = String;

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionState>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Returns the id of a live session, creating one when `id` is missing
    /// or unknown.
    pub async fn resolve(&self, id: Option<&str>, config: &AppConfig) -> SessionId {
        let mut w = self.sessions.write().await;
        self.sweep(&mut w);

        if let Some(id) = id {
            if let Some(state) = w.get_mut(id) {
                state.touch();
                return id.to_string();
            }
        }

        let new_id = Uuid::new_v4().to_string();
        w.insert(new_id.clone(), SessionState::new(config));
        info!("Created session {}", new_id);
        new_id
    }

    /// Runs `f` against the session, if it exists.
    pub async fn with_session<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Option<R> {
        let mut w = self.sessions.write().await;
        w.get_mut(id).map(f)
    }

    /// Runs read-only `f` against the session, if it exists.
    pub async fn read_session<R>(
        &self,
        id: &str,
        f: impl FnOnce(&SessionState) -> R,
    ) -> Option<R> {
        let r = self.sessions.read().await;
        r.get(id).map(f)
    }

    /// Drops a session.
    pub async fn remove(&self, id: &str) -> bool {
        let mut w = self.sessions.write().await;
        let removed = w.remove(id).is_some();
        if removed {
            info!("Ended session {}", id);
        }
        removed
    }

    fn sweep(&self, sessions: &mut HashMap<SessionId, SessionState>) {
        let cutoff = Local::now() - self.ttl;
        let before = sessions.len();
        sessions.retain(|_, state| state.last_seen > cutoff);
        let expired = before - sessions.len();
        if expired > 0 {
            debug!("Expired {} idle sessions", expired);
        }
    }
}
