//! Request body checks.
//!
//! Each validator runs every check and reports all failures together as one
//! `AppError::Validation`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Url;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::job::{JobFields, JobStatus};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Job create/update body. Unknown keys (`id`, `userId`, ...) are ignored,
/// so a client echoing a fetched record back cannot reassign ownership.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    pub company: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub applied_date: Option<String>,
    pub notes: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
}

pub struct Login {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate_job(input: JobInput) -> Result<JobFields, AppError> {
    let mut errors = Vec::new();

    let company = present(input.company);
    if company.is_none() {
        errors.push("Company is required".to_string());
    }
    let position = present(input.position);
    if position.is_none() {
        errors.push("Position is required".to_string());
    }

    let status = match present(input.status) {
        None => None,
        Some(raw) => match parse_status(&raw) {
            Ok(status) => Some(status),
            Err(e) => {
                errors.push(e);
                None
            }
        },
    };

    let applied_date = match present(input.applied_date) {
        None => None,
        Some(raw) => match parse_applied_date(&raw) {
            Some(date) => Some(date),
            None => {
                errors.push(format!("appliedDate '{raw}' is not a valid date"));
                None
            }
        },
    };

    let url = present(input.url);
    if let Some(url) = &url {
        if !is_web_url(url) {
            errors.push(format!("url '{url}' must be an absolute http(s) URL"));
        }
    }

    match (company, position) {
        (Some(company), Some(position)) if errors.is_empty() => Ok(JobFields {
            company,
            position,
            location: present(input.location),
            status,
            applied_date,
            notes: present(input.notes),
            url,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

pub fn parse_status(raw: &str) -> Result<JobStatus, String> {
    raw.parse::<JobStatus>().map_err(|e| e.to_string())
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
fn parse_applied_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn is_web_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// `local@domain.tld` with no whitespace; not an RFC 5322 parser.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

pub fn validate_registration(input: RegisterInput) -> Result<Registration, AppError> {
    let mut errors = Vec::new();

    let email = present(input.email).map(|e| e.to_lowercase());
    match &email {
        None => errors.push("Email is required".to_string()),
        Some(email) if !is_valid_email(email) => {
            errors.push("Email must be a valid email address".to_string())
        }
        Some(_) => {}
    }

    // Passwords are taken verbatim: surrounding spaces are part of the secret.
    let password = input.password.filter(|p| !p.is_empty());
    match &password {
        None => errors.push("Password is required".to_string()),
        Some(p) if p.chars().count() < MIN_PASSWORD_LEN => errors.push(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )),
        Some(_) => {}
    }

    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => {
            let name = present(input.name).unwrap_or_else(|| {
                email
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            });
            Ok(Registration {
                email,
                password,
                name,
            })
        }
        _ => Err(AppError::Validation(errors)),
    }
}

pub fn validate_login(input: LoginInput) -> Result<Login, AppError> {
    let email = present(input.email).map(|e| e.to_lowercase());
    let password = input.password.filter(|p| !p.is_empty());

    match (email, password) {
        (Some(email), Some(password)) => Ok(Login { email, password }),
        (email, password) => {
            let mut errors = Vec::new();
            if email.is_none() {
                errors.push("Email is required".to_string());
            }
            if password.is_none() {
                errors.push("Password is required".to_string());
            }
            Err(AppError::Validation(errors))
        }
    }
}

/// Extracts the job id from a LinkedIn job URL such as
/// `https://www.linkedin.com/jobs/view/3812345678/?refId=abc`.
pub fn linkedin_job_id(raw: &str) -> Result<String, AppError> {
    let invalid =
        || AppError::validation("url must be a LinkedIn job URL (https://www.linkedin.com/jobs/view/<id>)");

    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    match url.host_str() {
        Some("linkedin.com") | Some("www.linkedin.com") => {}
        _ => return Err(invalid()),
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        ["jobs", "view", id] => Ok((*id).to_string()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(company: &str, position: &str) -> JobInput {
        JobInput {
            company: Some(company.to_string()),
            position: Some(position.to_string()),
            ..Default::default()
        }
    }

    fn messages(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(messages) => messages,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_job_requires_company_and_position() {
        let errors = messages(validate_job(job("", "  ")).unwrap_err());
        assert_eq!(errors, vec!["Company is required", "Position is required"]);

        let errors = messages(validate_job(JobInput::default()).unwrap_err());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_job_collects_every_failure() {
        let input = JobInput {
            status: Some("ghosted".to_string()),
            applied_date: Some("last tuesday".to_string()),
            url: Some("ftp://example.com/job".to_string()),
            ..job("", "Engineer")
        };
        let errors = messages(validate_job(input).unwrap_err());
        assert_eq!(errors.len(), 4);
        assert!(errors[1].contains("applied, interview, rejected"));
    }

    #[test]
    fn test_job_trims_and_drops_blank_optionals() {
        let input = JobInput {
            location: Some("   ".to_string()),
            notes: Some(" phone screen booked ".to_string()),
            status: Some("interview".to_string()),
            applied_date: Some("2024-03-05".to_string()),
            ..job(" Acme ", "Engineer")
        };
        let fields = validate_job(input).unwrap();
        assert_eq!(fields.company, "Acme");
        assert_eq!(fields.location, None);
        assert_eq!(fields.notes.as_deref(), Some("phone screen booked"));
        assert_eq!(fields.status, Some(JobStatus::Interview));
        assert_eq!(
            fields.applied_date.unwrap().to_rfc3339(),
            "2024-03-05T00:00:00+00:00"
        );
    }

    #[test]
    fn test_applied_date_accepts_rfc3339() {
        let input = JobInput {
            applied_date: Some("2024-03-05T10:30:00+02:00".to_string()),
            ..job("Acme", "Engineer")
        };
        let fields = validate_job(input).unwrap();
        assert_eq!(
            fields.applied_date.unwrap().to_rfc3339(),
            "2024-03-05T08:30:00+00:00"
        );
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+jobs@mail.example.co.uk"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada @example.com"));
        assert!(!is_valid_email("ada@example..com"));
        assert!(!is_valid_email("ada"));
    }

    #[test]
    fn test_registration_rules() {
        let errors = messages(
            validate_registration(RegisterInput {
                email: Some("not-an-email".to_string()),
                password: Some("12345".to_string()),
                name: None,
            })
            .unwrap_err(),
        );
        assert_eq!(
            errors,
            vec![
                "Email must be a valid email address",
                "Password must be at least 6 characters long",
            ]
        );

        let ok = validate_registration(RegisterInput {
            email: Some(" Ada@Example.com ".to_string()),
            password: Some("123456".to_string()),
            name: None,
        })
        .unwrap();
        assert_eq!(ok.email, "ada@example.com");
        assert_eq!(ok.name, "ada");
    }

    #[test]
    fn test_login_requires_both_fields() {
        let errors = messages(
            validate_login(LoginInput {
                email: None,
                password: Some(String::new()),
            })
            .unwrap_err(),
        );
        assert_eq!(errors, vec!["Email is required", "Password is required"]);
    }

    #[test]
    fn test_debug_output_hides_password() {
        let registration = validate_registration(RegisterInput {
            email: Some("ada@example.com".to_string()),
            password: Some("hunter22".to_string()),
            name: Some("Ada".to_string()),
        })
        .unwrap();
        let login = validate_login(LoginInput {
            email: Some("ada@example.com".to_string()),
            password: Some("hunter22".to_string()),
        })
        .unwrap();

        for rendered in [format!("{registration:?}"), format!("{login:?}")] {
            assert!(rendered.contains("ada@example.com"));
            assert!(!rendered.contains("hunter22"));
        }
    }

    #[test]
    fn test_linkedin_job_id() {
        assert_eq!(
            linkedin_job_id("https://www.linkedin.com/jobs/view/3812345678/").unwrap(),
            "3812345678"
        );
        assert_eq!(
            linkedin_job_id("https://linkedin.com/jobs/view/3812345678?refId=x").unwrap(),
            "3812345678"
        );
        assert!(linkedin_job_id("https://www.linkedin.com/in/someone").is_err());
        assert!(linkedin_job_id("https://evil.com/jobs/view/1").is_err());
        assert!(linkedin_job_id("https://www.linkedin.com/jobs/view/").is_err());
        assert!(linkedin_job_id("not a url").is_err());
    }
}
