use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A job listing saved by a user, usually from the browser extension.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub company: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SaveJobRequest {
    pub title: String,
    pub company: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub url: Option<String>,
}

impl SaveJobRequest {
    pub fn validate(self) -> Result<NewJob, String> {
        let title = self.title.trim().to_string();
        let company = self.company.trim().to_string();
        if title.is_empty() || company.is_empty() {
            return Err("title and company are required".into());
        }
        if title.len() > 300 || company.len() > 300 {
            return Err("title and company must be at most 300 characters".into());
        }
        let url = self.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        if let Some(u) = &url {
            if !(u.starts_with("https://") || u.starts_with("http://")) || u.len() > 2048 {
                return Err("url must be an http(s) URL".into());
            }
        }
        Ok(NewJob { title, company, url })
    }
}
