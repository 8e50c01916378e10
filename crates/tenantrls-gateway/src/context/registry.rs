use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;

use tenantrls_core::model::TenantSecurityContext;

use crate::id;

struct ContextEntry {
    ctx: TenantSecurityContext,
    created_seq: u64,
    stored_at: Instant,
}

/// Security contexts keyed by session id.
///
/// Bounded: entries older than the TTL are dropped when touched, and the
/// oldest entry is evicted when an insert would exceed capacity.
pub struct ContextRegistry {
    contexts: DashMap<String, ContextEntry>,
    seq: AtomicU64,
    max_contexts: usize,
    ttl: Duration,
}

impl ContextRegistry {
    pub fn new(max_contexts: usize, ttl: Duration) -> Self {
        Self {
            contexts: DashMap::new(),
            seq: AtomicU64::new(1),
            max_contexts: max_contexts.max(1),
            ttl,
        }
    }

    /// Stamp `timestamp` and store under `session_id`, generating one if empty.
    /// A context with the same session id replaces the previous one.
    pub fn create_context(&self, mut ctx: TenantSecurityContext) -> TenantSecurityContext {
        ctx.timestamp = Utc::now();
        if ctx.session_id.is_empty() {
            ctx.session_id = id::generate("session");
        }

        if !self.contexts.contains_key(&ctx.session_id) {
            self.make_room();
        }

        let created_seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.contexts.insert(
            ctx.session_id.clone(),
            ContextEntry {
                ctx: ctx.clone(),
                created_seq,
                stored_at: Instant::now(),
            },
        );

        tracing::debug!(
            session_id = %ctx.session_id,
            tenant_id = %ctx.tenant_id,
            user_id = %ctx.user_id,
            "tenant context registered"
        );
        ctx
    }

    /// `None` when unknown or expired.
    pub fn get_context(&self, session_id: &str) -> Option<TenantSecurityContext> {
        {
            let e = self.contexts.get(session_id)?;
            if e.stored_at.elapsed() < self.ttl {
                return Some(e.ctx.clone());
            }
        }
        self.drop_if_expired(session_id);
        None
    }

    /// Remove `session_id` only if the entry under it is still stale, so a
    /// context re-created since the caller's read survives.
    fn drop_if_expired(&self, session_id: &str) {
        let ttl = self.ttl;
        self.contexts.remove_if(session_id, |_, e| e.stored_at.elapsed() >= ttl);
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    fn make_room(&self) {
        if self.contexts.len() < self.max_contexts {
            return;
        }

        let ttl = self.ttl;
        self.contexts.retain(|_, e| e.stored_at.elapsed() < ttl);

        while self.contexts.len() >= self.max_contexts {
            if self.evict_oldest().is_none() {
                break;
            }
        }
    }

    /// Evict the entry with the lowest creation sequence.
    fn evict_oldest(&self) -> Option<String> {
        let victim = self
            .contexts
            .iter()
            .min_by_key(|e| e.value().created_seq)
            .map(|e| e.key().clone())?;

        self.contexts.remove(&victim);
        tracing::debug!(session_id = %victim, "tenant context evicted");
        Some(victim)
    }
}
