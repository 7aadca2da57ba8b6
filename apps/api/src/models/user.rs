use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored account. Never serialized directly: it carries secrets.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2 PHC string; `None` for accounts created through LinkedIn.
    pub password_hash: Option<String>,
    pub name: String,
    pub linkedin_id: Option<String>,
    pub linkedin_access_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub linkedin_id: Option<String>,
}
