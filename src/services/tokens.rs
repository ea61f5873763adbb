//! Stateless signed bearer tokens.
//!
//! A token is `base64url(payload_json) "." base64url(hmac_sha256(key, base64url(payload_json)))`.
//! Each token kind signs with its own key, derived from the process-wide
//! session secret with HKDF, and carries its kind inside the payload, so a
//! token minted for one purpose never verifies for another.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use super::clock::Clock;

type HmacSha256 = Hmac<Sha256>;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

pub const SESSION_TTL_MS: i64 = 30 * DAY_MS;
pub const ADMIN_SESSION_TTL_MS: i64 = 30 * DAY_MS;
pub const EXTENSION_TTL_MS: i64 = 180 * DAY_MS;

/// Anything longer is rejected before decoding.
const MAX_TOKEN_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Session,
    Admin,
    Extension,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Session => "session",
            TokenKind::Admin => "admin",
            TokenKind::Extension => "extension",
        }
    }
}

/// A signed payload. Field order of the implementing struct is the wire order.
pub trait TokenPayload: Serialize + DeserializeOwned {
    const KIND: TokenKind;

    fn kind(&self) -> TokenKind;
    fn expires_at(&self) -> i64;
}

/// End-user browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub kind: TokenKind,
    pub uid: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Operator session for the admin area. Carries no user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub kind: TokenKind,
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Long-lived token held by the browser extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionClaims {
    pub kind: TokenKind,
    pub uid: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl TokenPayload for SessionClaims {
    const KIND: TokenKind = TokenKind::Session;

    fn kind(&self) -> TokenKind {
        self.kind
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl TokenPayload for AdminClaims {
    const KIND: TokenKind = TokenKind::Admin;

    fn kind(&self) -> TokenKind {
        self.kind
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl TokenPayload for ExtensionClaims {
    const KIND: TokenKind = TokenKind::Extension;

    fn kind(&self) -> TokenKind {
        self.kind
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// `now + ttl_ms`, refusing lifetimes that would overflow.
fn expiry(now: i64, ttl_ms: i64) -> anyhow::Result<i64> {
    now.checked_add(ttl_ms)
        .ok_or_else(|| anyhow::anyhow!("Token lifetime of {ttl_ms} ms is out of range"))
}

/// Derive the HMAC key for one token kind from the master secret.
fn derive_kind_key(master_secret: &[u8], kind: TokenKind) -> anyhow::Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, master_secret);
    let info = format!("jobtrail-token-{}", kind.as_str());
    let mut key = [0u8; 32];
    hk.expand(info.as_bytes(), &mut key)
        .map_err(|_| anyhow::anyhow!("Failed to derive {} token key", kind.as_str()))?;
    Ok(key)
}

pub struct TokenCodec {
    session_key: [u8; 32],
    admin_key: [u8; 32],
    extension_key: [u8; 32],
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(master_secret: &str, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        if master_secret.is_empty() {
            anyhow::bail!("Token secret must not be empty");
        }
        let secret = master_secret.as_bytes();
        Ok(Self {
            session_key: derive_kind_key(secret, TokenKind::Session)?,
            admin_key: derive_kind_key(secret, TokenKind::Admin)?,
            extension_key: derive_kind_key(secret, TokenKind::Extension)?,
            clock,
        })
    }

    fn key(&self, kind: TokenKind) -> &[u8; 32] {
        match kind {
            TokenKind::Session => &self.session_key,
            TokenKind::Admin => &self.admin_key,
            TokenKind::Extension => &self.extension_key,
        }
    }

    fn mac(&self, kind: TokenKind) -> anyhow::Result<HmacSha256> {
        HmacSha256::new_from_slice(self.key(kind))
            .map_err(|_| anyhow::anyhow!("Invalid HMAC key length"))
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Serialize and sign an already-built payload.
    pub fn sign<P: TokenPayload>(&self, claims: &P) -> anyhow::Result<String> {
        let json = serde_json::to_vec(claims)?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let mut mac = self.mac(P::KIND)?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify signature, kind and expiry. Every failure looks the same to the
    /// caller.
    pub fn verify<P: TokenPayload>(&self, token: &str) -> Option<P> {
        if token.len() > MAX_TOKEN_LEN {
            return None;
        }

        let mut parts = token.split('.');
        let (payload, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(s), None) if !p.is_empty() && !s.is_empty() => (p, s),
            _ => return None,
        };

        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac(P::KIND).ok()?;
        mac.update(payload.as_bytes());
        // constant-time comparison
        mac.verify_slice(&signature).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let claims: P = serde_json::from_slice(&json).ok()?;
        if claims.kind() != P::KIND {
            return None;
        }
        if self.clock.now_ms() > claims.expires_at() {
            return None;
        }
        Some(claims)
    }

    pub fn issue_session(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_session_with_ttl(user_id, SESSION_TTL_MS)
    }

    pub fn issue_session_with_ttl(&self, user_id: Uuid, ttl_ms: i64) -> anyhow::Result<String> {
        let now = self.now_ms();
        self.sign(&SessionClaims {
            kind: TokenKind::Session,
            uid: user_id,
            iat: now,
            exp: expiry(now, ttl_ms)?,
        })
    }

    pub fn issue_admin(&self) -> anyhow::Result<String> {
        let now = self.now_ms();
        self.sign(&AdminClaims {
            kind: TokenKind::Admin,
            admin: true,
            iat: now,
            exp: expiry(now, ADMIN_SESSION_TTL_MS)?,
        })
    }

    pub fn issue_extension(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = self.now_ms();
        self.sign(&ExtensionClaims {
            kind: TokenKind::Extension,
            uid: user_id,
            iat: now,
            exp: expiry(now, EXTENSION_TTL_MS)?,
        })
    }

    /// User id of a valid session token.
    pub fn verify_session(&self, token: &str) -> Option<Uuid> {
        self.verify::<SessionClaims>(token).map(|c| c.uid)
    }

    pub fn verify_admin(&self, token: &str) -> bool {
        self.verify::<AdminClaims>(token).is_some_and(|c| c.admin)
    }

    /// User id of a valid extension token.
    pub fn verify_extension(&self, token: &str) -> Option<Uuid> {
        self.verify::<ExtensionClaims>(token).map(|c| c.uid)
    }
}
