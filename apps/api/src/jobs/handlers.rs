use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::job::{JobApplication, JobFilter, JobSort};
use crate::state::AppState;
use crate::validation::{parse_status, validate_job, JobInput};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    pub sort_by: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<JobFilter, AppError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_status(raw).map_err(AppError::validation)?),
        };
        let sort = match self.sort_by.as_deref() {
            Some("date") => JobSort::AppliedDateDesc,
            _ => JobSort::Created,
        };
        Ok(JobFilter { status, sort })
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Job {id} not found"))
}

/// Loads a job the caller is about to modify.
async fn owned_job(state: &AppState, id: Uuid, user: &CurrentUser) -> Result<JobApplication, AppError> {
    let job = state.jobs.get_job(id).await?.ok_or_else(|| not_found(id))?;
    if job.user_id != user.id {
        warn!("User {} tried to modify job {id} owned by {}", user.id, job.user_id);
        return Err(AppError::Forbidden(
            "You do not have permission to modify this job application".to_string(),
        ));
    }
    Ok(job)
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<Vec<JobApplication>>, AppError> {
    let filter = query.into_filter()?;
    let jobs = state.jobs.list_jobs(user.id, filter).await?;
    Ok(Json(jobs))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<JobApplication>, AppError> {
    let job = state
        .jobs
        .get_job(id)
        .await?
        .filter(|job| job.user_id == user.id)
        .ok_or_else(|| not_found(id))?;
    Ok(Json(job))
}

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(request): AppJson<JobInput>,
) -> Result<(StatusCode, Json<JobApplication>), AppError> {
    let fields = validate_job(request)?;
    let job = state.jobs.create_job(user.id, fields).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// PUT /api/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<JobInput>,
) -> Result<Json<JobApplication>, AppError> {
    let fields = validate_job(request)?;
    owned_job(&state, id, &user).await?;

    // The row can vanish between the ownership check and the write.
    let job = state
        .jobs
        .update_job(id, fields)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!("User {} updated job {id}", user.id);
    Ok(Json(job))
}

/// DELETE /api/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    owned_job(&state, id, &user).await?;

    if !state.jobs.delete_job(id).await? {
        return Err(not_found(id));
    }
    info!("User {} deleted job {id}", user.id);
    Ok(Json(json!({ "message": "Job application deleted successfully" })))
}
