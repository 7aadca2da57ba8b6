pub mod health;


use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::{handlers as auth, oauth};
use crate::errors::render_internal_details;
use crate::jobs::handlers as jobs;
use crate::linkedin::handlers as linkedin;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let expose_details = state.config.app_env.is_development();

    let router = Router::new()
        .route("/health", get(health::health_handler))
        // Job records
        .route(
            "/api/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Auth
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/logout", post(auth::handle_logout))
        .route("/api/auth/status", get(auth::handle_status))
        .route("/api/auth/linkedin", get(oauth::handle_linkedin_login))
        .route(
            "/api/auth/linkedin/callback",
            get(oauth::handle_linkedin_callback),
        )
        // LinkedIn import
        .route(
            "/api/scrape-linkedin",
            post(linkedin::handle_scrape_linkedin),
        )
        .with_state(state);

    if expose_details {
        router.layer(middleware::from_fn(render_internal_details))
    } else {
        router
    }
}
