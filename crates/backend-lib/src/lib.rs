// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the Gatehouse authentication server.

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthRateLimiter, AuthService, DefaultAuth, SessionManager, TokenCodec};
use crate::config::Settings;
use crate::directory::PrincipalDirectory;

/// Application state shared across all handlers
pub struct AppState<D> {
    /// Authentication facade
    pub auth: Arc<dyn AuthService>,
    /// Session store
    pub sessions: Arc<SessionManager>,
    /// Settings
    pub settings: Arc<Settings>,
    /// Principal directory
    pub directory: D,
    /// Failed-login rate limiter
    pub rate_limiter: Arc<AuthRateLimiter>,
    /// Bearer-token codec
    pub codec: Arc<TokenCodec>,
}

impl<D: PrincipalDirectory + Clone + 'static> AppState<D> {
    /// Create a new application state
    pub fn new(directory: D, settings: Settings) -> Self {
        let sessions = Arc::new(SessionManager::new(Duration::from_secs(
            settings.session_ttl_secs,
        )));
        let codec = Arc::new(TokenCodec::new(&settings.token));
        let auth: Arc<dyn AuthService> = Arc::new(DefaultAuth::new(directory.clone()));
        let rate_limiter = Arc::new(AuthRateLimiter::default());

        // periodic sweep of lapsed lockouts
        let limiter = Arc::clone(&rate_limiter);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(60 * 60)).await;
                limiter.sweep();
            }
        });

        Self {
            auth,
            sessions,
            settings: Arc::new(settings),
            directory,
            rate_limiter,
            codec,
        }
    }
}
