use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Applied,
    Interview,
    Rejected,
}

#[derive(Debug, Error)]
#[error("Status must be one of: applied, interview, rejected (got '{0}')")]
pub struct UnknownStatus(pub String);

impl JobStatus {
    pub const ALL: [JobStatus; 3] = [JobStatus::Applied, JobStatus::Interview, JobStatus::Rejected];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Applied => "applied",
            JobStatus::Interview => "interview",
            JobStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for JobStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A tracked job application as stored and as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub applied_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated, client-editable fields of a job application.
///
/// On create, a missing `status` means `applied` and a missing `applied_date`
/// means now. On update, missing values keep what is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFields {
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub status: Option<JobStatus>,
    pub applied_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobSort {
    #[default]
    Created,
    AppliedDateDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub sort: JobSort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("interview".parse::<JobStatus>().unwrap(), JobStatus::Interview);
        assert!("Interview".parse::<JobStatus>().is_err());
        assert!("ghosted".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let now = Utc::now();
        let job = JobApplication {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            company: "Acme".to_string(),
            position: "Engineer".to_string(),
            location: None,
            status: JobStatus::Rejected,
            applied_date: now,
            notes: None,
            url: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["status"], "rejected");
        assert!(value.get("appliedDate").is_some());
        assert!(value.get("userId").is_some());
        assert!(value.get("applied_date").is_none());
    }
}
