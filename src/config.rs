//! Runtime configuration shared by the HTTP service and the CLI.
//! Values are public; nothing here is a secret.

use crate::{handoff::Routes, store::CookieOptions};
use thiserror::Error;

pub const DEFAULT_SUCCESS_PATH: &str = "/passkeys";
pub const DEFAULT_FAILURE_PATH: &str = "/login";
pub const DEFAULT_DESKTOP_URL: &str = "ente://app/gallery";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be an absolute in-app path starting with '/', got {value:?}")]
    InvalidPath { name: &'static str, value: String },
    #[error("invalid desktop url {value:?}: {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },
}

#[derive(Clone, Debug)]
pub struct HandoffConfig {
    pub routes: Routes,
    pub cookies: CookieOptions,
}

impl HandoffConfig {
    #[must_use]
    pub fn new(routes: Routes, cookies: CookieOptions) -> Self {
        Self { routes, cookies }
    }

    /// Default routes (`/passkeys`, `/login`, `ente://app/gallery`) with
    /// default cookie options.
    ///
    /// # Errors
    /// Returns an error if the built-in defaults fail validation.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Ok(Self::new(
            Routes::new(
                DEFAULT_SUCCESS_PATH,
                DEFAULT_FAILURE_PATH,
                DEFAULT_DESKTOP_URL,
            )?,
            CookieOptions::default(),
        ))
    }
}
