//! Bearer-token credentials for the remote API.

use pagedrop_core::PublishError;
use std::fmt;
use tracing::{error, info};

use crate::load_config::{AppConfig, TOKEN_ENV};

#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Credentials from resolved settings; fails before any network call when no token is set.
    pub fn from_config(config: &AppConfig) -> Result<Self, PublishError> {
        match config.token.as_deref() {
            Some(token) => {
                info!(token_set = !token.is_empty(), "Loaded API credentials");
                Ok(Self::new(token))
            }
            None => {
                error!("No API token configured");
                Err(PublishError::Unauthenticated(format!(
                    "no API token found; set {TOKEN_ENV} or `token` in the config file"
                )))
            }
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

// Keep the token out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}
