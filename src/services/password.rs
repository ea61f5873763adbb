use anyhow::Context;

/// Passwords shorter than this are rejected at registration and change.
pub const MIN_PASSWORD_LEN: usize = 8;

/// bcrypt only reads the first 72 bytes of its input; longer passwords are
/// rejected rather than silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Lowest bcrypt cost the library accepts. Only tests and local tooling
/// should go this low.
pub const MIN_COST: u32 = 4;

/// Hash a plaintext password with bcrypt at the given cost. Every call draws a
/// fresh random salt, so hashing the same password twice yields different
/// strings.
pub fn hash_password(plaintext: &str, cost: u32) -> anyhow::Result<String> {
    bcrypt::hash(plaintext, cost).context("Failed to hash password")
}

/// Check a plaintext password against a stored bcrypt hash.
///
/// The digest is recomputed with the stored salt and cost and compared in
/// constant time. A stored value that is not a parseable bcrypt hash counts as
/// a mismatch.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    bcrypt::verify(plaintext, stored_hash).unwrap_or(false)
}

/// Runs [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(plaintext: String, cost: u32) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext, cost))
        .await
        .context("Password hashing task failed")?
}

/// Runs [`verify_password`] on the blocking pool. A panicked task counts as a
/// mismatch.
pub async fn verify_password_blocking(plaintext: String, stored_hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&plaintext, &stored_hash))
        .await
        .unwrap_or(false)
}

/// Returns a human-readable reason when the password does not meet policy.
pub fn check_policy(plaintext: &str) -> Result<(), String> {
    if plaintext.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("Password must be at least {MIN_PASSWORD_LEN} characters"));
    }
    if plaintext.len() > MAX_PASSWORD_BYTES {
        return Err(format!("Password must be at most {MAX_PASSWORD_BYTES} bytes"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the suite fast; the verify path reads cost from the hash.
    fn quick_hash(plaintext: &str) -> String {
        hash_password(plaintext, MIN_COST).unwrap()
    }

    #[test]
    fn test_verify_matches_own_hash() {
        for pw in ["correct horse battery", "p@ssw0rd!", "ünïcødé-password"] {
            let stored = quick_hash(pw);
            assert!(verify_password(pw, &stored));
        }
    }

    #[test]
    fn test_verify_rejects_other_password() {
        let stored = quick_hash("first-password");
        assert!(!verify_password("second-password", &stored));
        assert!(!verify_password("first-passwor", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = quick_hash("same password");
        let b = quick_hash("same password");
        assert_ne!(a, b);
        assert!(!a.contains("same password"));
        assert!(verify_password("same password", &a));
        assert!(verify_password("same password", &b));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
        assert!(!verify_password("anything", "$2b$04$truncated"));
        assert!(hash_password("anything", 3).is_err());
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let stored = hash_password_blocking("hunter2hunter2".into(), MIN_COST).await.unwrap();
        assert!(verify_password_blocking("hunter2hunter2".into(), stored.clone()).await);
        assert!(!verify_password_blocking("hunter3hunter3".into(), stored).await);
    }

    #[test]
    fn test_policy() {
        assert!(check_policy("short").is_err());
        assert!(check_policy("long enough").is_ok());
        assert!(check_policy(&"x".repeat(73)).is_err());
    }
}
