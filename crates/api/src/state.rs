use std::sync::Arc;

use db::DbPool;

use crate::auth::{Authenticator, JwtAuthenticator};
use crate::config::ApiConfig;
use crate::permissions::PermissionEvaluator;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub authenticator: Arc<dyn Authenticator>,
    pub permissions: Arc<dyn PermissionEvaluator>,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        authenticator: Arc<dyn Authenticator>,
        permissions: Arc<dyn PermissionEvaluator>,
    ) -> Self {
        Self {
            pool,
            authenticator,
            permissions,
        }
    }

    /// JWT verification and the configured role table.
    pub fn from_config(pool: DbPool, config: ApiConfig) -> Self {
        Self::new(
            pool,
            Arc::new(JwtAuthenticator::new(config.jwt_secret.as_bytes())),
            Arc::new(config.roles),
        )
    }
}
