//! "Sign in with LinkedIn": the delegated-identity login path.
//!
//! The provider only proves who the user is. The session or token handed to
//! the browser afterwards comes from the deployment's `CredentialVerifier`,
//! the same as a password login.

use axum::{
    extract::State,
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::password::generate_token;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::AppQuery;
use crate::linkedin::LinkedInProfile;
use crate::models::user::{NewUser, User};
use crate::state::AppState;

const STATE_COOKIE: &str = "jobtrack_oauth_state";
const STATE_COOKIE_PATH: &str = "/api/auth/linkedin";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /api/auth/linkedin
pub async fn handle_linkedin_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let linkedin = state
        .linkedin
        .as_ref()
        .ok_or_else(|| AppError::NotImplemented("LinkedIn login is not configured".into()))?;

    let oauth_state = generate_token();
    let cookie = Cookie::build((STATE_COOKIE, oauth_state.clone()))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Redirect::to(&linkedin.authorize_url(&oauth_state)),
    ))
}

/// GET /api/auth/linkedin/callback
pub async fn handle_linkedin_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    AppQuery(query): AppQuery<CallbackQuery>,
) -> Result<(CookieJar, Redirect), AppError> {
    let linkedin = state
        .linkedin
        .as_ref()
        .ok_or_else(|| AppError::NotImplemented("LinkedIn login is not configured".into()))?;

    if let Some(error) = query.error {
        warn!("LinkedIn login refused: {error}");
        return Err(AppError::unauthorized(
            query
                .error_description
                .unwrap_or_else(|| format!("LinkedIn login failed: {error}")),
        ));
    }

    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    match (&expected, &query.state) {
        (Some(expected), Some(got)) if expected == got => {}
        _ => {
            warn!("LinkedIn callback with missing or mismatched state");
            return Err(AppError::unauthorized("OAuth state mismatch"));
        }
    }
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path(STATE_COOKIE_PATH));

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::validation("code is required"))?;

    let access_token = linkedin.exchange_code(&code).await?;
    let profile = linkedin.fetch_profile(&access_token).await?;
    let user = find_or_create_user(&state, &profile).await?;
    state
        .users
        .link_linkedin(user.id, &profile.sub, &access_token)
        .await?;

    let user = CurrentUser::from(&user);
    info!("User {} signed in with LinkedIn", user.id);

    let issued = state.auth.issue(&user, jar).await?;
    let target = match issued.token {
        Some(token) => format!("{}#token={token}", state.config.client_url),
        None => state.config.client_url.clone(),
    };
    Ok((issued.jar, Redirect::to(&target)))
}

/// Matches on LinkedIn id first, then on email, else registers a new
/// password-less account. Linking by email requires LinkedIn to vouch for
/// the address.
async fn find_or_create_user(state: &AppState, profile: &LinkedInProfile) -> Result<User, AppError> {
    if let Some(user) = state.users.find_user_by_linkedin_id(&profile.sub).await? {
        return Ok(user);
    }

    let email = profile
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::unauthorized("LinkedIn did not share an email address"))?;

    if let Some(user) = state.users.find_user_by_email(&email).await? {
        if profile.email_verified != Some(true) {
            warn!(
                "Refusing to link LinkedIn {} to user {}: email not verified",
                profile.sub, user.id
            );
            return Err(AppError::unauthorized(
                "LinkedIn email is not verified. Sign in with your password instead",
            ));
        }
        return Ok(user);
    }

    let name = profile
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.clone());

    state
        .users
        .create_user(NewUser {
            email,
            password_hash: None,
            name,
            linkedin_id: Some(profile.sub.clone()),
        })
        .await
}
