//! Persistence seams.
//!
//! Handlers only see these traits. `AppState` carries them as `Arc<dyn _>`;
//! `postgres::PgStore` is the production backend and tests swap in the
//! in-memory one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobApplication, JobFields, JobFilter};
use crate::models::session::Session;
use crate::models::user::{NewUser, User};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Jobs owned by `owner`, filtered and ordered per `filter`.
    async fn list_jobs(&self, owner: Uuid, filter: JobFilter)
        -> Result<Vec<JobApplication>, AppError>;

    async fn get_job(&self, id: Uuid) -> Result<Option<JobApplication>, AppError>;

    async fn create_job(&self, owner: Uuid, fields: JobFields)
        -> Result<JobApplication, AppError>;

    /// Returns `None` when no row has this id.
    async fn update_job(&self, id: Uuid, fields: JobFields)
        -> Result<Option<JobApplication>, AppError>;

    /// Returns whether a row was removed.
    async fn delete_job(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_linkedin_id(&self, linkedin_id: &str)
        -> Result<Option<User>, AppError>;

    /// Attaches a LinkedIn identity to the user and stores the provider token.
    async fn link_linkedin(
        &self,
        user_id: Uuid,
        linkedin_id: &str,
        access_token: &str,
    ) -> Result<(), AppError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError>;

    async fn find_session(&self, id: &str) -> Result<Option<Session>, AppError>;

    async fn delete_session(&self, id: &str) -> Result<(), AppError>;

    /// Removes every session that expired at or before `now`. Returns the count.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
