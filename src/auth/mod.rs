// Bearer-token authentication and tenant resolution
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use thiserror::Error;

use crate::config;
use crate::error::ApiError;

/// Tenant header consumed on every authenticated request
pub const ORG_ID_HEADER: &str = "x-org-id";

/// Authenticated user identity as verified by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Per-request authenticated, tenant-scoped context. Built once by the auth
/// middleware, carried as a request extension, never persisted.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthUser,
    pub org_id: String,
    pub offline: bool,
}

/// Extract the bearer token from the Authorization header.
///
/// The scheme must be exactly `Bearer` followed by a single space; any other
/// scheme (`Basic`, lowercase `bearer`, a double space, an empty token) or a
/// missing header yields `None`. Never panics.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() || token.starts_with(' ') {
        return None;
    }
    Some(token.to_string())
}

/// Extract the tenant id from the X-Org-ID header, `None` when absent or empty.
pub fn extract_org_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(ORG_ID_HEADER)?.to_str().ok()?;
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("token rejected")]
    Rejected,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// External identity/session provider; the pipeline depends only on this trait.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, IdentityError>;
}

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("membership store unavailable: {0}")]
    Unavailable(String),
}

/// Organization-membership store; authorizes a verified user for a tenant.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn is_member(&self, user_id: &str, org_id: &str) -> Result<bool, MembershipError>;
}

/// Whether the process-wide offline flag is set
pub fn offline_mode_enabled() -> bool {
    config::config().auth.offline_mode
}

/// Deterministic fixture context used only when offline mode is active:
/// always the same synthetic user, bound to the requested org.
pub fn mock_auth_context(org_id: &str) -> AuthContext {
    AuthContext {
        user: AuthUser {
            id: "mock-user-123".to_string(),
            email: "user@example.com".to_string(),
        },
        org_id: org_id.to_string(),
        offline: true,
    }
}

/// Resolves request headers into an [`AuthContext`] via the injected
/// collaborators.
pub struct AuthResolver {
    identity: Arc<dyn IdentityProvider>,
    membership: Arc<dyn MembershipStore>,
}

impl AuthResolver {
    pub fn new(identity: Arc<dyn IdentityProvider>, membership: Arc<dyn MembershipStore>) -> Self {
        Self { identity, membership }
    }

    /// Authenticate a request from its headers.
    ///
    /// Failure order: missing token, invalid token, missing org header,
    /// org access denied. Offline mode still requires both headers to be
    /// present but skips the identity provider and membership store.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, ApiError> {
        let token = extract_bearer_token(headers).ok_or_else(ApiError::missing_token)?;

        if offline_mode_enabled() {
            let org_id = extract_org_id(headers).ok_or_else(ApiError::missing_org_id)?;
            tracing::debug!(org_id = %org_id, "offline mode: bypassing identity provider");
            return Ok(mock_auth_context(&org_id));
        }

        let user = self.identity.verify(&token).await.map_err(|e| match e {
            IdentityError::Rejected => ApiError::invalid_token(),
            IdentityError::Unavailable(msg) => {
                tracing::error!("identity provider error: {}", msg);
                ApiError::internal_error()
            }
        })?;

        let org_id = extract_org_id(headers).ok_or_else(ApiError::missing_org_id)?;

        let member = self
            .membership
            .is_member(&user.id, &org_id)
            .await
            .map_err(|e| {
                tracing::error!("membership store error: {}", e);
                ApiError::internal_error()
            })?;

        if !member {
            tracing::warn!(user_id = %user.id, org_id = %org_id, "org access denied");
            return Err(ApiError::org_access_denied());
        }

        Ok(AuthContext { user, org_id, offline: false })
    }
}

/// In-memory identity provider backed by a static token table. Used for
/// development and tests; production wires a real provider behind the trait.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, AuthUser>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(
        mut self,
        token: impl Into<String>,
        user_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.tokens
            .insert(token.into(), AuthUser { id: user_id.into(), email: email.into() });
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, token: &str) -> Result<AuthUser, IdentityError> {
        self.tokens.get(token).cloned().ok_or(IdentityError::Rejected)
    }
}

/// In-memory membership store mapping users to the orgs they belong to
#[derive(Debug, Default)]
pub struct StaticMembershipStore {
    members: HashMap<String, HashSet<String>>,
}

impl StaticMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, user_id: impl Into<String>, org_id: impl Into<String>) -> Self {
        self.members.entry(user_id.into()).or_default().insert(org_id.into());
        self
    }
}

#[async_trait]
impl MembershipStore for StaticMembershipStore {
    async fn is_member(&self, user_id: &str, org_id: &str) -> Result<bool, MembershipError> {
        Ok(self.members.get(user_id).map(|orgs| orgs.contains(org_id)).unwrap_or(false))
    }
}
