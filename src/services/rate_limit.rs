//! In-process fixed-window rate limiting.
//!
//! Each key gets a counter that lives for one window. The first request after
//! the window closes starts a fresh window with a count of one. A client can
//! therefore land up to `2 × limit` requests around a window boundary (the
//! tail of one window plus the head of the next); that is the accepted cost
//! of fixed windows over sliding ones.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::clock::Clock;

/// Table size at which inserting a new key first sweeps expired buckets.
pub const CLEANUP_THRESHOLD: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bucket {
    count: u32,
    window_reset_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allow,
    Deny { retry_after_secs: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allow)
    }
}

/// Limit and window for one scope of endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub scope: &'static str,
    pub limit: u32,
    pub window_ms: u64,
}

impl RateLimitRule {
    pub const fn new(scope: &'static str, limit: u32, window_secs: u64) -> Self {
        Self { scope, limit, window_ms: window_secs * 1000 }
    }

    /// `scope:identifier`
    pub fn key(&self, identifier: &str) -> String {
        format!("{}:{}", self.scope, identifier)
    }
}

/// One rule per guarded scope. Scopes never share buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRules {
    pub login: RateLimitRule,
    pub register: RateLimitRule,
    pub change_password: RateLimitRule,
    pub admin_login: RateLimitRule,
    pub admin_settings: RateLimitRule,
    pub extension_token: RateLimitRule,
    pub extension_verify: RateLimitRule,
    pub extension_save_job: RateLimitRule,
}

impl Default for RateLimitRules {
    fn default() -> Self {
        Self {
            login: RateLimitRule::new("auth:login", 10, 15 * 60),
            register: RateLimitRule::new("auth:register", 5, 60 * 60),
            change_password: RateLimitRule::new("auth:change-password", 5, 15 * 60),
            admin_login: RateLimitRule::new("admin:login", 5, 15 * 60),
            admin_settings: RateLimitRule::new("admin:settings", 30, 60),
            extension_token: RateLimitRule::new("extension:token", 10, 60 * 60),
            extension_verify: RateLimitRule::new("extension:verify", 60, 60),
            extension_save_job: RateLimitRule::new("extension:save-job", 30, 60),
        }
    }
}

pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Count one request against `key` and decide whether it may proceed.
    ///
    /// The lookup, reset and increment happen under a single lock acquisition
    /// so concurrent callers on the same key never lose an update.
    pub fn check(&self, key: &str, limit: u32, window_ms: u64) -> RateLimitDecision {
        let now = self.clock.now_ms();
        let window_ms = i64::try_from(window_ms).unwrap_or(i64::MAX);
        // A poisoned lock only means another request panicked mid-check; the
        // map itself is still consistent.
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(bucket) = buckets.get_mut(key) {
            if bucket.window_reset_at > now {
                if bucket.count < limit {
                    bucket.count += 1;
                    return RateLimitDecision::Allow;
                }
                return RateLimitDecision::Deny {
                    retry_after_secs: retry_after_secs(bucket.window_reset_at - now),
                };
            }
            *bucket = Bucket { count: 1, window_reset_at: now.saturating_add(window_ms) };
            return RateLimitDecision::Allow;
        }

        if buckets.len() >= CLEANUP_THRESHOLD {
            let before = buckets.len();
            buckets.retain(|_, b| b.window_reset_at > now);
            tracing::debug!(
                removed = before - buckets.len(),
                remaining = buckets.len(),
                "rate limiter swept expired buckets"
            );
        }

        buckets.insert(
            key.to_string(),
            Bucket { count: 1, window_reset_at: now.saturating_add(window_ms) },
        );
        crate::services::metrics::RATE_LIMIT_BUCKETS.set(buckets.len() as f64);
        RateLimitDecision::Allow
    }

    pub fn check_rule(&self, rule: &RateLimitRule, identifier: &str) -> RateLimitDecision {
        self.check(&rule.key(identifier), rule.limit, rule.window_ms)
    }

    /// Number of buckets currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn retry_after_secs(remaining_ms: i64) -> u64 {
    let remaining_ms = remaining_ms.max(0) as u64;
    remaining_ms.div_ceil(1000).max(1)
}
