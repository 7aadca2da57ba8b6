use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::linkedin::JobPosting;
use crate::state::AppState;
use crate::validation::linkedin_job_id;

const NOTES_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: Option<String>,
}

/// Pre-filled fields for the job form. Not persisted.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JobDraft {
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub url: String,
    pub notes: String,
}

impl JobDraft {
    pub fn from_posting(posting: JobPosting, url: String) -> Self {
        let preview: String = posting
            .description
            .unwrap_or_default()
            .chars()
            .take(NOTES_PREVIEW_CHARS)
            .collect();

        JobDraft {
            company: posting.company.name,
            position: posting.title,
            location: posting.location,
            url,
            notes: format!("Scraped from LinkedIn - {preview}..."),
        }
    }
}

/// POST /api/scrape-linkedin
///
/// Looks up a LinkedIn job posting with the caller's stored LinkedIn token.
pub async fn handle_scrape_linkedin(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(request): AppJson<ScrapeRequest>,
) -> Result<Json<JobDraft>, AppError> {
    let linkedin = state
        .linkedin
        .as_ref()
        .ok_or_else(|| AppError::NotImplemented("LinkedIn integration is not configured".into()))?;

    let url = request
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::validation("url is required"))?;
    let job_id = linkedin_job_id(&url)?;

    let access_token = state
        .users
        .find_user_by_id(user.id)
        .await?
        .and_then(|u| u.linkedin_access_token)
        .ok_or_else(|| {
            AppError::unauthorized("LinkedIn account not connected. Please sign in with LinkedIn")
        })?;

    let posting = linkedin.fetch_job(&access_token, &job_id).await?;
    info!("Imported LinkedIn job {job_id} for user {}", user.id);

    Ok(Json(JobDraft::from_posting(posting, url)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkedin::PostingCompany;

    #[test]
    fn test_draft_truncates_description() {
        let posting = JobPosting {
            title: "Rust Engineer".to_string(),
            company: PostingCompany {
                name: "Ferris Inc".to_string(),
            },
            location: Some("Remote".to_string()),
            description: Some("é".repeat(500)),
        };
        let draft = JobDraft::from_posting(posting, "https://www.linkedin.com/jobs/view/1".into());

        assert_eq!(draft.company, "Ferris Inc");
        assert_eq!(draft.position, "Rust Engineer");
        assert!(draft.notes.starts_with("Scraped from LinkedIn - é"));
        assert!(draft.notes.ends_with("..."));
        assert_eq!(draft.notes.chars().filter(|c| *c == 'é').count(), 200);
    }
}
