//! Authentication.
//!
//! Exactly one [`CredentialVerifier`] variant is active per deployment,
//! picked from `AUTH_MODE` at startup. Handlers never branch on it: they take
//! a [`CurrentUser`] (or [`MaybeUser`]) extractor and call `issue` / `revoke`.

pub mod handlers;
pub mod oauth;
pub mod password;
pub mod session;
pub mod token;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::{AuthMode, Config};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};

use self::session::SessionAuth;
use self::token::TokenIssuer;

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        CurrentUser {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

pub enum CredentialVerifier {
    Bearer(TokenIssuer),
    Session(SessionAuth),
}

/// What a successful login hands back: the cookie jar to send, plus a token
/// when the deployment uses bearer credentials.
pub struct IssuedCredential {
    pub jar: CookieJar,
    pub token: Option<String>,
}

impl CredentialVerifier {
    pub fn from_config(
        config: &Config,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> anyhow::Result<Self> {
        match config.auth_mode {
            AuthMode::Bearer => {
                let secret = config
                    .jwt_secret
                    .as_deref()
                    .context("JWT_SECRET is required for bearer authentication")?;
                Ok(CredentialVerifier::Bearer(TokenIssuer::new(
                    secret,
                    config.token_ttl_hours,
                )))
            }
            AuthMode::Session => Ok(CredentialVerifier::Session(SessionAuth::new(
                sessions,
                users,
                config.session_cookie_name.clone(),
                config.cookie_secure,
                config.session_ttl_hours,
            ))),
        }
    }

    /// Resolves the caller's identity.
    ///
    /// `Ok(None)` means no credential was presented; a credential that is
    /// present but bad is an `Unauthorized` error.
    pub async fn authenticate(&self, parts: &Parts) -> Result<Option<CurrentUser>, AppError> {
        match self {
            CredentialVerifier::Bearer(issuer) => {
                let Some(header) = parts.headers.get(AUTHORIZATION) else {
                    return Ok(None);
                };
                let token = header
                    .to_str()
                    .ok()
                    .and_then(|value| {
                        value
                            .strip_prefix("Bearer ")
                            .or_else(|| value.strip_prefix("bearer "))
                    })
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .ok_or_else(|| AppError::unauthorized("Invalid token format"))?;
                issuer.verify(token).map(Some)
            }
            CredentialVerifier::Session(sessions) => {
                let jar = CookieJar::from_headers(&parts.headers);
                sessions.resolve(&jar).await
            }
        }
    }

    pub async fn issue(
        &self,
        user: &CurrentUser,
        jar: CookieJar,
    ) -> Result<IssuedCredential, AppError> {
        match self {
            CredentialVerifier::Bearer(issuer) => Ok(IssuedCredential {
                jar,
                token: Some(issuer.issue(user)?),
            }),
            CredentialVerifier::Session(sessions) => Ok(IssuedCredential {
                jar: sessions.start(user, jar).await?,
                token: None,
            }),
        }
    }

    /// Bearer tokens are stateless, so revoking one is up to the client.
    pub async fn revoke(&self, jar: CookieJar) -> Result<CookieJar, AppError> {
        match self {
            CredentialVerifier::Bearer(_) => Ok(jar),
            CredentialVerifier::Session(sessions) => sessions.end(jar).await,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        state
            .auth
            .authenticate(parts)
            .await?
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// Identity if the request carries a valid credential, `None` otherwise.
/// Bad credentials are treated as absent; storage failures still propagate.
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        match state.auth.authenticate(parts).await {
            Ok(user) => Ok(MaybeUser(user)),
            Err(AppError::Unauthorized(reason)) => {
                debug!("Ignoring invalid credential: {reason}");
                Ok(MaybeUser(None))
            }
            Err(e) => Err(e),
        }
    }
}
