// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router for the authentication endpoints.
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::directory::PrincipalDirectory;
use crate::handlers::auth;
use crate::AppState;

/// Create the authentication router
pub fn create_router<D: PrincipalDirectory + 'static>(state: Arc<AppState<D>>) -> Router {
    Router::new()
        .route("/signup", post(auth::signup::<D>))
        .route("/auth/login", post(auth::login::<D>))
        // logging in while a pending link is present is the
        // link-to-existing transition, so the handler is the same
        .route("/auth/link/existing", post(auth::login::<D>))
        .route("/auth/oauth/complete", post(auth::oauth_complete::<D>))
        .route("/auth/link/new", post(auth::link_new::<D>))
        .route("/auth/link/abandon", post(auth::link_abandon::<D>))
        .route("/auth/token", post(auth::issue_token::<D>))
        .route("/auth/session", post(auth::session_overview::<D>))
        .route("/auth/logout", post(auth::logout::<D>))
        .route("/me", get(auth::me::<D>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
