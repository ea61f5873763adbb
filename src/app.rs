use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    config::{AdminPassword, Config},
    db::UserStore,
    middleware::{
        edge_guard::edge_guard,
        extension::{API_KEY_HEADER, USER_TOKEN_HEADER},
    },
    routes,
    services::{clock::Clock, password, rate_limit::RateLimiter, tokens::TokenCodec},
};

/// The one operator account, with its password already in hashed form.
#[derive(Clone)]
pub struct AdminAccount {
    pub username: String,
    pub password_hash: String,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenCodec>,
    pub rate_limiter: Arc<RateLimiter>,
    pub admin: Option<Arc<AdminAccount>>,
    /// Hash of a random string, verified against when a login names an
    /// unknown account so both failure paths cost the same.
    pub dummy_hash: Arc<str>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let tokens = TokenCodec::new(&config.session_secret, clock.clone())?;

        let admin = match &config.admin {
            Some(creds) => {
                let password_hash = match &creds.password {
                    AdminPassword::Hash(hash) => hash.clone(),
                    AdminPassword::Plain(plain) => password::hash_password(plain, config.bcrypt_cost)?,
                };
                Some(Arc::new(AdminAccount {
                    username: creds.username.clone(),
                    password_hash,
                }))
            }
            None => None,
        };

        let dummy_hash = password::hash_password(&uuid::Uuid::new_v4().to_string(), config.bcrypt_cost)?;

        Ok(Self {
            store,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            rate_limiter: Arc::new(RateLimiter::new(clock)),
            admin,
            dummy_hash: dummy_hash.into(),
        })
    }
}

/// Extension endpoints are called cross-origin from a browser extension. Every
/// response, rejections included, carries these headers so the extension can
/// read the status code.
fn extension_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(AllowMethods::list([Method::POST, Method::OPTIONS]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
            HeaderName::from_static(USER_TOKEN_HEADER),
        ]))
}

pub fn build_router(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(routes::pages::home))
        .route("/login", get(routes::pages::login))
        .route("/register", get(routes::pages::register))
        .route("/dashboard", get(routes::pages::dashboard))
        .route("/jobs", get(routes::pages::jobs))
        .route("/applications", get(routes::pages::applications))
        .route("/settings", get(routes::pages::settings))
        .route("/admin", get(routes::pages::admin_home))
        .route("/admin/login", get(routes::pages::admin_login))
        .layer(from_fn(edge_guard));

    let extension = Router::new()
        .route("/api/extension/verify", post(routes::extension::verify))
        .route("/api/extension/jobs", post(routes::extension::save_job))
        .layer(extension_cors());

    let api = Router::new()
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/auth/change-password", post(routes::auth::change_password))
        // Admin
        .route("/api/admin/login", post(routes::admin::login))
        .route("/api/admin/logout", post(routes::admin::logout))
        .route("/api/admin/session", get(routes::admin::session))
        .route(
            "/api/admin/settings",
            get(routes::admin::list_settings).put(routes::admin::put_setting),
        )
        .route("/api/jobs", get(routes::jobs::list_jobs))
        // Extension token issuance (same-origin, session cookie)
        .route("/api/extension/token", post(routes::extension::issue_token))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler));

    Router::new()
        .merge(pages)
        .merge(api)
        .merge(extension)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
