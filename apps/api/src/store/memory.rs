use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobApplication, JobFields, JobFilter, JobSort};
use crate::models::session::Session;
use crate::models::user::{NewUser, User};
use crate::store::{JobStore, SessionStore, UserStore};

/// In-memory stand-in for `PgStore`, used by router tests.
#[derive(Default)]
pub struct MemoryStore {
    jobs: Mutex<Vec<JobApplication>>,
    users: Mutex<Vec<User>>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Rewinds a session's expiry, for expiry tests.
    pub fn expire_session(&self, id: &str) {
        if let Some(session) = self.sessions.lock().unwrap().get_mut(id) {
            session.expires_at = Utc::now() - chrono::Duration::minutes(1);
        }
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn list_jobs(
        &self,
        owner: Uuid,
        filter: JobFilter,
    ) -> Result<Vec<JobApplication>, AppError> {
        let mut jobs: Vec<JobApplication> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|job| job.user_id == owner)
            .filter(|job| filter.status.map_or(true, |s| job.status == s))
            .cloned()
            .collect();

        if filter.sort == JobSort::AppliedDateDesc {
            jobs.sort_by(|a, b| b.applied_date.cmp(&a.applied_date));
        }
        Ok(jobs)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobApplication>, AppError> {
        Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn create_job(
        &self,
        owner: Uuid,
        fields: JobFields,
    ) -> Result<JobApplication, AppError> {
        let now = Utc::now();
        let job = JobApplication {
            id: Uuid::new_v4(),
            user_id: owner,
            company: fields.company,
            position: fields.position,
            location: fields.location,
            status: fields.status.unwrap_or_default(),
            applied_date: fields.applied_date.unwrap_or(now),
            notes: fields.notes,
            url: fields.url,
            created_at: now,
            updated_at: now,
        };
        self.jobs.lock().unwrap().push(job.clone());
        Ok(job)
    }

    async fn update_job(
        &self,
        id: Uuid,
        fields: JobFields,
    ) -> Result<Option<JobApplication>, AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.iter_mut().find(|j| j.id == id) else {
            return Ok(None);
        };
        job.company = fields.company;
        job.position = fields.position;
        job.location = fields.location;
        if let Some(status) = fields.status {
            job.status = status;
        }
        if let Some(applied_date) = fields.applied_date {
            job.applied_date = applied_date;
        }
        job.notes = fields.notes;
        job.url = fields.url;
        job.updated_at = Utc::now();
        Ok(Some(job.clone()))
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool, AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        Ok(jobs.len() != before)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            linkedin_id: user.linkedin_id,
            linkedin_access_token: None,
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_linkedin_id(
        &self,
        linkedin_id: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.linkedin_id.as_deref() == Some(linkedin_id))
            .cloned())
    }

    async fn link_linkedin(
        &self,
        user_id: Uuid,
        linkedin_id: &str,
        access_token: &str,
    ) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
        user.linkedin_id = Some(linkedin_id.to_string());
        user.linkedin_access_token = Some(access_token.to_string());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(
        &self,
        id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let session = Session {
            id: id.to_string(),
            user_id,
            created_at: Utc::now(),
            expires_at,
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(id.to_string(), session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: &str) -> Result<Option<Session>, AppError> {
        Ok(self.sessions.lock().unwrap().get(id).cloned())
    }

    async fn delete_session(&self, id: &str) -> Result<(), AppError> {
        self.sessions.lock().unwrap().remove(id);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}
