use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info};

/// Minimum time between two lazy prune passes.
const PRUNE_INTERVAL_SECS: i64 = 300;
/// Entries are kept this long past their natural expiry before pruning.
const PRUNE_GRACE_SECS: i64 = 60;

/// Tokens invalidated by logout, mapped to their natural expiry (unix
/// seconds). A listed token is rejected even while its signature and expiry
/// are still valid. Entries are dropped only once the token would fail
/// verification anyway.
#[derive(Clone, Default)]
pub struct RevocationStore {
    tokens: Arc<DashMap<String, i64>>,
    last_prune: Arc<AtomicI64>,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: revoking a token twice has the same effect as once.
    pub fn revoke(&self, token: &str, expires_at: i64) {
        self.tokens
            .entry(token.to_string())
            .and_modify(|exp| *exp = (*exp).max(expires_at))
            .or_insert(expires_at);
        debug!(expires_at, revoked = self.tokens.len(), "Token revoked");

        self.maybe_prune(Utc::now().timestamp());
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn maybe_prune(&self, now: i64) {
        let last = self.last_prune.load(Ordering::Relaxed);
        if now - last < PRUNE_INTERVAL_SECS {
            return;
        }

        if self
            .last_prune
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            self.prune(now);
        }
    }

    /// Drops entries whose token expired more than the grace period before
    /// `now`. Returns how many were removed.
    pub fn prune(&self, now: i64) -> usize {
        let before = self.tokens.len();
        self.tokens
            .retain(|_, expires_at| *expires_at + PRUNE_GRACE_SECS >= now);
        let removed = before.saturating_sub(self.tokens.len());

        if removed > 0 {
            info!(removed, remaining = self.tokens.len(), "Pruned expired revocations");
        }
        removed
    }
}
