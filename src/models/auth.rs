use uuid::Uuid;

/// Identity resolved from a verified session cookie by
/// `middleware::auth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Proof that the request carried a valid admin session token.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

/// Identity resolved from a verified `X-User-Token` extension token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionUser {
    pub user_id: Uuid,
}
