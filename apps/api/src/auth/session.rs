//! Cookie credentials backed by the server-side session store.

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::auth::password::generate_token;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::store::{SessionStore, UserStore};

pub struct SessionAuth {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    cookie_name: String,
    cookie_secure: bool,
    ttl: Duration,
}

impl SessionAuth {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        cookie_name: String,
        cookie_secure: bool,
        ttl_hours: i64,
    ) -> Self {
        Self {
            sessions,
            users,
            cookie_name,
            cookie_secure,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Creates a session for `user` and sets its id as a cookie.
    /// Expired sessions left behind by other clients are pruned first.
    pub async fn start(&self, user: &CurrentUser, jar: CookieJar) -> Result<CookieJar, AppError> {
        let pruned = self.sessions.delete_expired_sessions(Utc::now()).await?;
        if pruned > 0 {
            debug!("Pruned {pruned} expired sessions");
        }

        let id = generate_token();
        let session = self
            .sessions
            .create_session(&id, user.id, Utc::now() + self.ttl)
            .await?;
        info!("Started session for user {} (expires {})", user.id, session.expires_at);

        let cookie = Cookie::build((self.cookie_name.clone(), id))
            .path("/")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .build();
        Ok(jar.add(cookie))
    }

    /// `None` when the request carries no session cookie at all.
    pub async fn resolve(&self, jar: &CookieJar) -> Result<Option<CurrentUser>, AppError> {
        let Some(cookie) = jar.get(&self.cookie_name) else {
            return Ok(None);
        };
        let id = cookie.value();

        let Some(session) = self.sessions.find_session(id).await? else {
            debug!("Session cookie does not match a stored session");
            return Err(AppError::unauthorized("Session expired or invalid"));
        };

        if session.is_expired(Utc::now()) {
            self.sessions.delete_session(id).await?;
            debug!("Session for user {} expired", session.user_id);
            return Err(AppError::unauthorized("Session expired or invalid"));
        }

        let user = self
            .users
            .find_user_by_id(session.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Session expired or invalid"))?;

        Ok(Some(CurrentUser::from(&user)))
    }

    /// Deletes the stored session, if any, and clears the cookie.
    pub async fn end(&self, jar: CookieJar) -> Result<CookieJar, AppError> {
        if let Some(cookie) = jar.get(&self.cookie_name) {
            self.sessions.delete_session(cookie.value()).await?;
        }
        Ok(jar.remove(Cookie::build(self.cookie_name.clone()).path("/")))
    }
}
