pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    job::{Job, NewJob},
    user::{NewUser, User},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the trust core needs from persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `email` is expected in normalized (trimmed, lowercase) form.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;

    async fn list_settings(&self) -> StoreResult<BTreeMap<String, String>>;
    async fn put_setting(&self, key: &str, value: &str) -> StoreResult<()>;

    async fn save_job(&self, user_id: Uuid, job: NewJob) -> StoreResult<Job>;
    async fn list_jobs(&self, user_id: Uuid) -> StoreResult<Vec<Job>>;

    /// Cheap liveness probe for `/health`.
    async fn ping(&self) -> StoreResult<()>;
}

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded from ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
