use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobApplication, JobFields, JobFilter, JobSort};
use crate::models::session::Session;
use crate::models::user::{NewUser, User};
use crate::store::{JobStore, SessionStore, UserStore};

/// PostgreSQL-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn list_jobs(
        &self,
        owner: Uuid,
        filter: JobFilter,
    ) -> Result<Vec<JobApplication>, AppError> {
        let sql = match filter.sort {
            JobSort::Created => {
                r#"
                SELECT * FROM job_applications
                WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
                ORDER BY created_at ASC, id ASC
                "#
            }
            JobSort::AppliedDateDesc => {
                r#"
                SELECT * FROM job_applications
                WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
                ORDER BY applied_date DESC, id ASC
                "#
            }
        };

        let jobs = sqlx::query_as::<_, JobApplication>(sql)
            .bind(owner)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobApplication>, AppError> {
        let job = sqlx::query_as::<_, JobApplication>("SELECT * FROM job_applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn create_job(
        &self,
        owner: Uuid,
        fields: JobFields,
    ) -> Result<JobApplication, AppError> {
        let job = sqlx::query_as::<_, JobApplication>(
            r#"
            INSERT INTO job_applications
                (id, user_id, company, position, location, status, applied_date, notes, url)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()), $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&fields.company)
        .bind(&fields.position)
        .bind(&fields.location)
        .bind(fields.status.unwrap_or_default().as_str())
        .bind(fields.applied_date)
        .bind(&fields.notes)
        .bind(&fields.url)
        .fetch_one(&self.pool)
        .await?;

        info!("Created job application {} for user {owner}", job.id);
        Ok(job)
    }

    async fn update_job(
        &self,
        id: Uuid,
        fields: JobFields,
    ) -> Result<Option<JobApplication>, AppError> {
        let job = sqlx::query_as::<_, JobApplication>(
            r#"
            UPDATE job_applications SET
                company      = $2,
                position     = $3,
                location     = $4,
                status       = COALESCE($5, status),
                applied_date = COALESCE($6, applied_date),
                notes        = $7,
                url          = $8,
                updated_at   = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.company)
        .bind(&fields.position)
        .bind(&fields.location)
        .bind(fields.status.map(|s| s.as_str()))
        .bind(fields.applied_date)
        .bind(&fields.notes)
        .bind(&fields.url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM job_applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, name, linkedin_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.linkedin_id)
        .fetch_one(&self.pool)
        .await?;

        info!("Created user {}", created.id);
        Ok(created)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_linkedin_id(
        &self,
        linkedin_id: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE linkedin_id = $1")
            .bind(linkedin_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn link_linkedin(
        &self,
        user_id: Uuid,
        linkedin_id: &str,
        access_token: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET linkedin_id = $2, linkedin_access_token = $3 WHERE id = $1",
        )
        .bind(user_id)
        .bind(linkedin_id)
        .bind(access_token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(
        &self,
        id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn find_session(&self, id: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn delete_session(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
