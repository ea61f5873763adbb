use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult, UserStore};
use crate::models::{
    job::{Job, NewJob},
    user::{NewUser, User},
};

/// Process-local store for development without Postgres, and for tests.
/// Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    settings: RwLock<BTreeMap<String, String>>,
    jobs: RwLock<Vec<Job>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        // Single write lock covers the uniqueness check and the insert
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: Utc::now(),
        };
        users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::UserNotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn list_settings(&self) -> StoreResult<BTreeMap<String, String>> {
        Ok(self.settings.read().await.clone())
    }

    async fn put_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        self.settings
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn save_job(&self, user_id: Uuid, job: NewJob) -> StoreResult<Job> {
        let row = Job {
            id: Uuid::new_v4(),
            user_id,
            title: job.title,
            company: job.company,
            url: job.url,
            created_at: Utc::now(),
        };
        self.jobs.write().await.push(row.clone());
        Ok(row)
    }

    async fn list_jobs(&self, user_id: Uuid) -> StoreResult<Vec<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.iter().rev().filter(|j| j.user_id == user_id).cloned().collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            name: "Test".into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        let by_email = store.find_user_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        let by_id = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");
        assert!(store.find_user_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();
        assert!(matches!(
            store.create_user(new_user("a@example.com")).await,
            Err(StoreError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_update_password_hash() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        store.update_password_hash(user.id, "new-hash").await.unwrap();
        let reloaded = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "new-hash");

        assert!(matches!(
            store.update_password_hash(Uuid::new_v4(), "x").await,
            Err(StoreError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_jobs_are_per_user() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let job = NewJob { title: "Engineer".into(), company: "Acme".into(), url: None };
        store.save_job(alice, job.clone()).await.unwrap();
        store.save_job(alice, job.clone()).await.unwrap();
        store.save_job(bob, job).await.unwrap();

        assert_eq!(store.list_jobs(alice).await.unwrap().len(), 2);
        assert_eq!(store.list_jobs(bob).await.unwrap().len(), 1);
    }
}
