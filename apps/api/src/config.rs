use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::auth::password::Argon2Params;

/// Which credential strategy the deployment uses. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Signed JWT presented in the `Authorization` header.
    Bearer,
    /// Server-side session looked up from a cookie.
    Session,
}

impl FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" | "jwt" => Ok(AuthMode::Bearer),
            "session" | "cookie" => Ok(AuthMode::Session),
            other => bail!("AUTH_MODE must be 'bearer' or 'session', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn is_development(self) -> bool {
        self == AppEnv::Development
    }
}

/// OAuth client registration for LinkedIn. Present only when fully configured.
#[derive(Debug, Clone)]
pub struct LinkedInConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Application configuration loaded from environment variables.
/// Built once in `main` and handed to the router through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub auth_mode: AuthMode,
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,
    pub session_ttl_hours: i64,
    pub session_cookie_name: String,
    pub cookie_secure: bool,
    pub cors_origin: String,
    /// Where OAuth logins land after the callback.
    pub client_url: String,
    pub app_env: AppEnv,
    pub port: u16,
    pub rust_log: String,
    pub linkedin: Option<LinkedInConfig>,
    pub password_params: Argon2Params,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let auth_mode: AuthMode = optional_env("AUTH_MODE")
            .unwrap_or_else(|| "bearer".to_string())
            .parse()?;

        let jwt_secret = optional_env("JWT_SECRET");
        if auth_mode == AuthMode::Bearer && jwt_secret.is_none() {
            bail!("JWT_SECRET is required when AUTH_MODE=bearer");
        }

        let cors_origin =
            optional_env("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        let app_env = match optional_env("APP_ENV").as_deref() {
            Some("development") | Some("dev") => AppEnv::Development,
            _ => AppEnv::Production,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            auth_mode,
            jwt_secret,
            token_ttl_hours: parse_env("TOKEN_TTL_HOURS", 24)?,
            session_ttl_hours: parse_env("SESSION_TTL_HOURS", 24 * 7)?,
            session_cookie_name: optional_env("SESSION_COOKIE_NAME")
                .unwrap_or_else(|| "jobtrack_session".to_string()),
            cookie_secure: parse_env("COOKIE_SECURE", false)?,
            client_url: optional_env("CLIENT_URL").unwrap_or_else(|| cors_origin.clone()),
            cors_origin,
            app_env,
            port: parse_env("PORT", 3000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            linkedin: linkedin_from_env(),
            password_params: Argon2Params::default(),
        })
    }
}

fn linkedin_from_env() -> Option<LinkedInConfig> {
    Some(LinkedInConfig {
        client_id: optional_env("LINKEDIN_CLIENT_ID")?,
        client_secret: optional_env("LINKEDIN_CLIENT_SECRET")?,
        redirect_uri: optional_env("LINKEDIN_REDIRECT_URI")?,
    })
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Config for router tests: no database, cheap password hashing.
    pub fn for_tests(auth_mode: AuthMode) -> Self {
        Config {
            database_url: String::new(),
            auth_mode,
            jwt_secret: Some("test-secret-key-for-jwt".to_string()),
            token_ttl_hours: 1,
            session_ttl_hours: 1,
            session_cookie_name: "jobtrack_session".to_string(),
            cookie_secure: false,
            cors_origin: "http://localhost:5173".to_string(),
            client_url: "http://localhost:5173".to_string(),
            app_env: AppEnv::Production,
            port: 0,
            rust_log: "debug".to_string(),
            linkedin: None,
            password_params: Argon2Params {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
        }
    }
}
