use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_gauge, CounterVec, Gauge};

lazy_static! {
    // ── Event counters ──────────────────────────────────────────────────────
    pub static ref LOGINS_COUNTER: CounterVec = register_counter_vec!(
        "api_logins_total",
        "Login attempts by account kind and outcome",
        &["kind", "status"]
    ).unwrap();

    pub static ref RATE_LIMITED_COUNTER: CounterVec = register_counter_vec!(
        "api_rate_limited_total",
        "Requests rejected by the rate limiter, by scope",
        &["scope"]
    ).unwrap();

    pub static ref TOKENS_ISSUED_COUNTER: CounterVec = register_counter_vec!(
        "api_tokens_issued_total",
        "Signed tokens issued, by kind",
        &["kind"]
    ).unwrap();

    // ── State ───────────────────────────────────────────────────────────────
    pub static ref RATE_LIMIT_BUCKETS: Gauge = register_gauge!(
        "api_rate_limit_buckets",
        "Buckets held in the in-process rate limiter table"
    ).unwrap();
}

pub fn record_login(kind: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    LOGINS_COUNTER.with_label_values(&[kind, status]).inc();
}
