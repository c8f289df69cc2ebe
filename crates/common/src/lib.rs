// ================
// crates/common/src/lib.rs
// ================
//! Common types and structures
//! shared between the Gatehouse authentication backend and its clients.
//! This module defines the HTTP request/reply payloads and the user-facing
//! notice types rendered by a frontend.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a user-facing notice, mapped to frontend styling.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Danger,
}

/// A queued user-facing message, rendered once and then discarded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Display text
    pub text: String,
    /// Display severity
    pub severity: Severity,
}

impl Notice {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }
}

/// Register a new username/password principal.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

/// Interactive password login.
/// # Fields
/// * `session_token` - Optional existing session; carrying it across an
///   OAuth round-trip is what preserves a pending link.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Ingest of an already-completed OAuth handshake: the provider has
/// verified the profile, the backend only sees its identity.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OAuthCompleteRequest {
    pub provider: String,
    pub provider_id: String,
    /// Opaque profile payload as returned by the provider
    #[serde(default)]
    pub profile: serde_json::Value,
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Any request that only needs an established session.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionRequest {
    pub session_token: String,
}

/// Public view of a principal; never carries credential material.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PrincipalSummary {
    pub id: Uuid,
    pub username: String,
    pub verified: bool,
    pub identities: Vec<ProviderIdentityRef>,
}

/// A linked external-provider identity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentityRef {
    pub provider: String,
    pub provider_id: String,
}

/// Reply to an authentication attempt.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "outcome")]
pub enum AuthReply {
    /// Verification succeeded and the session is now authenticated
    Authenticated {
        session_token: String,
        principal: PrincipalSummary,
        notices: Vec<Notice>,
    },
    /// Verification failed; `reason` is a stable machine-readable code
    Rejected {
        session_token: String,
        reason: String,
        notices: Vec<Notice>,
    },
    /// The provider verified the profile but no local account is linked;
    /// the client must offer the link-or-create choice
    LinkRequired {
        session_token: String,
        provider: String,
        provider_id: String,
        notices: Vec<Notice>,
    },
}

/// Reply to a pending-link resolution request.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "result")]
pub enum LinkReply {
    /// A fresh principal was created, pre-linked to the provider identity
    Created {
        session_token: String,
        principal: PrincipalSummary,
    },
    /// The pending link was discarded without touching any account
    Abandoned { session_token: String },
}

/// Reply to a bearer-token issuance request.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenReply {
    pub token: String,
    pub expires_in_secs: u64,
}

/// Snapshot of a session for rendering: who is signed in, whether a
/// link decision is outstanding, and any queued notices (drained).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionReply {
    pub authenticated: Option<PrincipalSummary>,
    pub pending_link: Option<ProviderIdentityRef>,
    pub notices: Vec<Notice>,
}
