// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Per-session state and the in-memory session store.
use dashmap::DashMap;
use gatehouse_common::{Notice, Severity};
use metrics::{counter, gauge};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

use crate::auth::identity::SerializedIdentity;
use crate::auth::linking::PendingLinkRecord;
use crate::auth::token_generator::generate_session_token;
use crate::metrics as metric_keys;

/// Default session TTL (time to live)
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7); // 7 days

/// Everything one session holds between requests.
///
/// Sessions hold at most one pending provider link; recording a new one
/// replaces the previous record, so only the latest provider sign-in can
/// be resolved. The store serializes access per session, and each request
/// borrows the state mutably for its whole attempt.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Durable reference to the authenticated principal, if any
    pub identity: Option<SerializedIdentity>,
    /// Queued user-facing notices, oldest first
    notices: VecDeque<Notice>,
    /// A provider identity awaiting a link-or-create decision
    pub pending_link: Option<PendingLinkRecord>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Queue a user-facing notice for the next render
    pub fn push_notice(&mut self, text: impl Into<String>, severity: Severity) {
        self.notices.push_back(Notice::new(text, severity));
    }

    /// Remove and return all queued notices, oldest first
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Peek at the queued notices without consuming them
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }
}

/// Shared handle to one session's state. The inner mutex is the
/// at-most-one-mutation-in-flight guarantee the strategies rely on.
pub type SessionHandle = Arc<Mutex<SessionState>>;

struct SessionSlot {
    created_at: SystemTime,
    expires_at: SystemTime,
    state: SessionHandle,
}

/// Session store keyed by opaque bearer tokens.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<DashMap<String, SessionSlot>>,
    ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(ttl: Duration) -> Self {
        let manager = SessionManager {
            sessions: Arc::new(DashMap::new()),
            ttl,
        };

        // Spawn the session cleanup task
        let manager_clone = manager.clone();
        tokio::spawn(async move {
            manager_clone.cleanup_task().await;
        });

        manager
    }

    /// Create an empty session and return its token and state handle
    pub fn create(&self) -> (String, SessionHandle) {
        let token = generate_session_token();
        let now = SystemTime::now();
        let state: SessionHandle = Arc::new(Mutex::new(SessionState::new()));

        self.sessions.insert(
            token.clone(),
            SessionSlot {
                created_at: now,
                expires_at: now + self.ttl,
                state: Arc::clone(&state),
            },
        );

        counter!(metric_keys::SESSION_CREATED).increment(1);
        gauge!(metric_keys::SESSION_ACTIVE).set(self.sessions.len() as f64);

        (token, state)
    }

    /// Fetch the live state for a token. Expired sessions are dropped on
    /// access, which implicitly abandons any pending link they held.
    pub fn get(&self, token: &str) -> Option<SessionHandle> {
        let now = SystemTime::now();
        {
            let slot = self.sessions.get(token)?;
            if now < slot.expires_at {
                return Some(Arc::clone(&slot.state));
            }
        }

        // expired: remove outside the shard guard
        if self.sessions.remove(token).is_some() {
            counter!(metric_keys::SESSION_EXPIRED).increment(1);
            gauge!(metric_keys::SESSION_ACTIVE).set(self.sessions.len() as f64);
        }
        None
    }

    /// Check whether a token refers to a live session
    pub fn validate(&self, token: &str) -> bool {
        self.get(token).is_some()
    }

    /// Destroy a session outright (logout). Returns whether it existed.
    pub fn destroy(&self, token: &str) -> bool {
        let Some((_, slot)) = self.sessions.remove(token) else {
            return false;
        };

        if let Ok(state) = slot.state.try_lock() {
            if let Some(pending) = &state.pending_link {
                tracing::debug!(
                    provider = %pending.provider,
                    "session destroyed with unresolved pending link"
                );
                counter!(metric_keys::LINK_ABANDONED, "resolution" => "abandoned").increment(1);
            }
        }

        gauge!(metric_keys::SESSION_ACTIVE).set(self.sessions.len() as f64);
        true
    }

    /// Number of currently live sessions
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Cleanup task that runs periodically to remove expired sessions
    async fn cleanup_task(&self) {
        let cleanup_interval = Duration::from_secs(60 * 60); // 1 hour

        loop {
            tokio::time::sleep(cleanup_interval).await;

            let now = SystemTime::now();
            let before_count = self.sessions.len();

            self.sessions.retain(|_, slot| {
                let keep = now < slot.expires_at;
                if !keep {
                    if let Ok(age) = now.duration_since(slot.created_at) {
                        tracing::debug!(age_secs = age.as_secs(), "expiring session");
                    }
                }
                keep
            });

            let after_count = self.sessions.len();
            let removed = before_count.saturating_sub(after_count);

            if removed > 0 {
                counter!(metric_keys::SESSION_EXPIRED).increment(removed as u64);
                gauge!(metric_keys::SESSION_ACTIVE).set(after_count as f64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_queue_is_fifo() {
        let mut state = SessionState::new();
        state.push_notice("first", Severity::Danger);
        state.push_notice("second", Severity::Info);

        assert_eq!(state.notices().count(), 2);

        let drained = state.drain_notices();
        assert_eq!(drained[0].text, "first");
        assert_eq!(drained[1].text, "second");
        assert_eq!(state.notices().count(), 0);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let manager = SessionManager::new(SESSION_TTL);

        let (token, handle) = manager.create();
        assert!(manager.validate(&token));
        assert_eq!(manager.active_count(), 1);

        {
            let mut state = handle.lock().await;
            state.push_notice("hello", Severity::Info);
        }

        let fetched = manager.get(&token).unwrap();
        assert_eq!(fetched.lock().await.notices().count(), 1);

        assert!(manager.destroy(&token));
        assert!(!manager.validate(&token));
        assert!(!manager.destroy(&token));
    }

    #[tokio::test]
    async fn test_expired_session_dropped_on_access() {
        let manager = SessionManager::new(Duration::ZERO);

        let (token, _handle) = manager.create();
        assert!(manager.get(&token).is_none());
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_token_invalid() {
        let manager = SessionManager::new(SESSION_TTL);
        assert!(!manager.validate("no-such-token"));
    }
}
