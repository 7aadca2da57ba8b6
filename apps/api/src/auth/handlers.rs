use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{CurrentUser, MaybeUser};
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::user::NewUser;
use crate::state::AppState;
use crate::validation::{validate_login, validate_registration, LoginInput, RegisterInput};

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: CurrentUser,
    /// Only set when the deployment uses bearer tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub user: Option<CurrentUser>,
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(request): AppJson<RegisterInput>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let registration = validate_registration(request)?;

    if state
        .users
        .find_user_by_email(&registration.email)
        .await?
        .is_some()
    {
        return Err(AppError::validation(
            "An account with this email already exists",
        ));
    }

    let params = state.config.password_params;
    let password = registration.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, params))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    let user = state
        .users
        .create_user(NewUser {
            email: registration.email,
            password_hash: Some(password_hash),
            name: registration.name,
            linkedin_id: None,
        })
        .await?;
    let user = CurrentUser::from(&user);
    info!("Registered user {}", user.id);

    let issued = state.auth.issue(&user, jar).await?;
    Ok((
        StatusCode::CREATED,
        issued.jar,
        Json(AuthResponse {
            user,
            token: issued.token,
        }),
    ))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(request): AppJson<LoginInput>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let login = validate_login(request)?;

    let Some(user) = state.users.find_user_by_email(&login.email).await? else {
        warn!("Login attempt for unknown email");
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    };

    // LinkedIn-only accounts have no password to check against.
    let Some(stored_hash) = user.password_hash.clone() else {
        warn!("Password login attempted for LinkedIn-only user {}", user.id);
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    };

    let password = login.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    if !matches {
        warn!("Wrong password for user {}", user.id);
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    }

    let user = CurrentUser::from(&user);
    let issued = state.auth.issue(&user, jar).await?;
    info!("User {} logged in", user.id);

    Ok((
        issued.jar,
        Json(AuthResponse {
            user,
            token: issued.token,
        }),
    ))
}

/// POST /api/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let jar = state.auth.revoke(jar).await?;
    info!("User {} logged out", user.id);
    Ok((jar, Json(json!({ "message": "Logged out successfully" }))))
}

/// GET /api/auth/status
pub async fn handle_status(MaybeUser(user): MaybeUser) -> Json<AuthStatus> {
    Json(AuthStatus {
        authenticated: user.is_some(),
        user,
    })
}
