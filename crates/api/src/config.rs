//! Settings the HTTP layer needs at startup.

use std::path::Path;

use thiserror::Error;

use crate::permissions::RolePermissions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT secret must not be empty")]
    EmptySecret,

    #[error("could not read role table {path}: {source}")]
    RolesUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid role table {path}: {source}")]
    RolesInvalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HS256 key used to verify access tokens.
    pub jwt_secret: String,
    pub roles: RolePermissions,
}

impl ApiConfig {
    /// Build the config, reading the role table from `roles_file` when given
    /// and falling back to [`RolePermissions::with_defaults`] otherwise.
    pub fn load(jwt_secret: String, roles_file: Option<&Path>) -> Result<Self, ConfigError> {
        if jwt_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        let roles = match roles_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::RolesUnreadable {
                    path: path.display().to_string(),
                    source,
                })?;
                RolePermissions::from_json(&raw).map_err(|source| ConfigError::RolesInvalid {
                    path: path.display().to_string(),
                    source,
                })?
            }
            None => RolePermissions::with_defaults(),
        };

        Ok(Self { jwt_secret, roles })
    }
}
