use std::env;

use rand::RngCore;

use crate::services::{
    password,
    rate_limit::{RateLimitRule, RateLimitRules},
};

/// Minimum accepted length for `SESSION_SECRET`, in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Operator account for the admin area. There is exactly one; it is not a row
/// in the user table.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: AdminPassword,
}

#[derive(Clone)]
pub enum AdminPassword {
    /// bcrypt hash, as printed by the `hash-password` binary
    Hash(String),
    /// Plaintext from the environment; hashed once at startup.
    Plain(String),
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub session_secret: String,
    pub extension_api_key: Option<String>,
    /// `None` only in production when nothing was configured; the admin
    /// login endpoint then fails closed.
    pub admin: Option<AdminCredentials>,
    pub rate_limits: RateLimitRules,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("extension_api_key", &self.extension_api_key.as_ref().map(|_| "<set>"))
            .field("admin", &self.admin)
            .field("rate_limits", &self.rate_limits)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = match env::var("APP_ENV").unwrap_or_default().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        let database_url = optional("DATABASE_URL");
        if environment.is_production() && database_url.is_none() {
            anyhow::bail!("Missing required env var in production: DATABASE_URL");
        }

        let session_secret = match optional("SESSION_SECRET") {
            Some(secret) if secret.len() >= MIN_SESSION_SECRET_LEN => secret,
            Some(_) => anyhow::bail!(
                "SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} bytes"
            ),
            None if environment.is_production() => {
                anyhow::bail!("Missing required env var in production: SESSION_SECRET")
            }
            None => {
                tracing::warn!(
                    "SESSION_SECRET not set: using a random per-process secret, sessions will not survive a restart"
                );
                random_secret()
            }
        };

        let admin = admin_from_env(environment);

        let bcrypt_cost: u32 = match optional("BCRYPT_COST") {
            Some(v) => v.parse()?,
            None => bcrypt::DEFAULT_COST,
        };
        if !(password::MIN_COST..=31).contains(&bcrypt_cost) {
            anyhow::bail!("BCRYPT_COST must be between {} and 31", password::MIN_COST);
        }

        Ok(Self {
            environment,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            database_url,
            session_secret,
            extension_api_key: optional("EXTENSION_API_KEY"),
            admin,
            rate_limits: rate_limits_from_env()?,
            bcrypt_cost,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    /// Settings suitable for tests and local tooling: development mode, fixed
    /// secret, default limits, cheapest bcrypt cost.
    pub fn for_development(session_secret: impl Into<String>) -> Self {
        Self {
            environment: Environment::Development,
            host: "127.0.0.1".into(),
            port: 8080,
            database_url: None,
            session_secret: session_secret.into(),
            extension_api_key: None,
            admin: Some(AdminCredentials {
                username: "admin".into(),
                password: AdminPassword::Plain("admin".into()),
            }),
            rate_limits: RateLimitRules::default(),
            bcrypt_cost: password::MIN_COST,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn admin_from_env(environment: Environment) -> Option<AdminCredentials> {
    let username = optional("ADMIN_USERNAME");
    let password = optional("ADMIN_PASSWORD_HASH")
        .map(AdminPassword::Hash)
        .or_else(|| optional("ADMIN_PASSWORD").map(AdminPassword::Plain));

    match (username, password) {
        (Some(username), Some(password)) => Some(AdminCredentials { username, password }),
        _ if environment.is_production() => {
            tracing::error!("Admin credentials not configured: admin login is disabled");
            None
        }
        _ => {
            tracing::warn!("Admin credentials not configured: using development default admin/admin");
            Some(AdminCredentials {
                username: "admin".into(),
                password: AdminPassword::Plain("admin".into()),
            })
        }
    }
}

fn rate_limits_from_env() -> anyhow::Result<RateLimitRules> {
    let defaults = RateLimitRules::default();
    Ok(RateLimitRules {
        login: rule_from_env("LOGIN", defaults.login)?,
        register: rule_from_env("REGISTER", defaults.register)?,
        change_password: rule_from_env("CHANGE_PASSWORD", defaults.change_password)?,
        admin_login: rule_from_env("ADMIN_LOGIN", defaults.admin_login)?,
        admin_settings: rule_from_env("ADMIN_SETTINGS", defaults.admin_settings)?,
        extension_token: rule_from_env("EXTENSION_TOKEN", defaults.extension_token)?,
        extension_verify: rule_from_env("EXTENSION_VERIFY", defaults.extension_verify)?,
        extension_save_job: rule_from_env("EXTENSION_SAVE_JOB", defaults.extension_save_job)?,
    })
}

fn rule_from_env(name: &str, default: RateLimitRule) -> anyhow::Result<RateLimitRule> {
    let limit = match optional(&format!("RATE_LIMIT_{name}_MAX")) {
        Some(v) => v.parse()?,
        None => default.limit,
    };
    let window_ms = match optional(&format!("RATE_LIMIT_{name}_WINDOW_SECS")) {
        Some(v) => v.parse::<u64>()? * 1000,
        None => default.window_ms,
    };
    if limit == 0 || window_ms == 0 {
        anyhow::bail!("RATE_LIMIT_{name}_* must be positive");
    }
    Ok(RateLimitRule { scope: default.scope, limit, window_ms })
}
