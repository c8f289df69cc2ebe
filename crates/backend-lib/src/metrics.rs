// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const AUTH_ATTEMPT: &str = "auth.attempt";
pub const AUTH_REJECTED: &str = "auth.rejected";
pub const AUTH_LOCKOUT: &str = "auth.lockout";
pub const SESSION_CREATED: &str = "auth.session.created";
pub const SESSION_ACTIVE: &str = "auth.session.active";
pub const SESSION_EXPIRED: &str = "auth.session.expired";
pub const LINK_PENDING: &str = "auth.link.pending";
pub const LINK_RESOLVED: &str = "auth.link.resolved";
pub const LINK_ABANDONED: &str = "auth.link.abandoned";
