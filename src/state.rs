use std::sync::Arc;

use crate::auth::{
    AuthResolver, IdentityProvider, MembershipStore, StaticIdentityProvider,
    StaticMembershipStore,
};
use crate::handlers::records::RecordStore;
use crate::idempotency::{IdempotencyStore, InMemoryIdempotencyStore};
use crate::rate_limit::{CounterStore, InMemoryCounterStore, RateLimiter};

/// Shared application state. Every external collaborator is injected here
/// once at process start and flows through axum state; the only process-wide
/// singleton left is the read-only config.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthResolver>,
    pub rate_limiter: Arc<RateLimiter>,
    pub idempotency: Arc<dyn IdempotencyStore>,
    pub records: Arc<RecordStore>,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        membership: Arc<dyn MembershipStore>,
        counters: Arc<dyn CounterStore>,
        idempotency: Arc<dyn IdempotencyStore>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthResolver::new(identity, membership)),
            rate_limiter: Arc::new(RateLimiter::new(counters)),
            idempotency,
            records: Arc::new(RecordStore::new()),
        }
    }

    /// Single-instance wiring: in-memory stores plus a small static token
    /// table. Distributed deployments swap the stores behind the same traits.
    pub fn in_memory() -> Self {
        let identity = StaticIdentityProvider::new()
            .with_token("dev-token-alice", "user-alice", "alice@example.com")
            .with_token("dev-token-bob", "user-bob", "bob@example.com");
        let membership = StaticMembershipStore::new()
            .with_member("user-alice", "org-acme")
            .with_member("user-alice", "org-globex")
            .with_member("user-bob", "org-globex");

        Self::new(
            Arc::new(identity),
            Arc::new(membership),
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(InMemoryIdempotencyStore::new()),
        )
    }
}
