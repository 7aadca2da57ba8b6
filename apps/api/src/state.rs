use std::sync::Arc;

use crate::auth::CredentialVerifier;
use crate::config::Config;
use crate::linkedin::LinkedInApi;
use crate::store::{JobStore, UserStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jobs: Arc<dyn JobStore>,
    pub users: Arc<dyn UserStore>,
    /// The one credential strategy this deployment runs with.
    pub auth: Arc<CredentialVerifier>,
    /// `None` unless all LinkedIn client settings are present.
    pub linkedin: Option<Arc<dyn LinkedInApi>>,
}
