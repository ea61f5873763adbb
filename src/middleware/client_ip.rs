use axum::http::HeaderMap;

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Identifier used to key rate-limit buckets.
/// Priority: first `X-Forwarded-For` entry → `X-Real-IP` → `"unknown"`.
pub fn client_identifier(headers: &HeaderMap) -> String {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = xff.split(',').next().map(str::trim).filter(|s| !s.is_empty()) {
            return first.to_string();
        }
    }
    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return ip.to_string();
    }
    UNKNOWN_CLIENT.to_string()
}
