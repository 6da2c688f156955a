//! Store credentials
//!
//! Credentials come from the `store` section of the configuration file, or
//! from the standard AWS environment variables when the file leaves them out.
//!
//! # Example
//!
//! ```
//! use asset_sync::store::Credentials;
//!
//! let creds = Credentials::new("access-key", "secret-key");
//! assert_eq!(creds.access_key_id(), "access-key");
//! assert_eq!(creds.secret_access_key(), "secret-key");
//! ```

use crate::config::StoreConfig;
use thiserror::Error;

/// Environment variable holding the access key ID
pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret access key
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable holding an optional session token
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Credential loading errors
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

/// Access credentials for request signing
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create new credentials
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token (temporary credentials)
    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(session_token.into());
        self
    }

    /// Get the access key ID
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the secret access key
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Get the session token (if any)
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Factory for credentials from the supported sources
pub struct CredentialsProvider;

impl CredentialsProvider {
    /// Load credentials from environment variables
    pub fn from_env() -> Result<Credentials, CredentialsError> {
        let access_key = non_empty_env(ENV_ACCESS_KEY_ID).ok_or_else(|| {
            CredentialsError::MissingCredentials(format!("{} not set", ENV_ACCESS_KEY_ID))
        })?;

        let secret_key = non_empty_env(ENV_SECRET_ACCESS_KEY).ok_or_else(|| {
            CredentialsError::MissingCredentials(format!("{} not set", ENV_SECRET_ACCESS_KEY))
        })?;

        let credentials = Credentials::new(access_key, secret_key);
        Ok(match non_empty_env(ENV_SESSION_TOKEN) {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }

    /// Load credentials from the store configuration
    pub fn from_config(config: &StoreConfig) -> Result<Credentials, CredentialsError> {
        let access_key = config
            .access_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CredentialsError::MissingCredentials("access_key not set in config".into())
            })?;

        let secret_key = config
            .secret_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CredentialsError::MissingCredentials("secret_key not set in config".into())
            })?;

        let credentials = Credentials::new(access_key, secret_key);
        Ok(match config.session_token.as_deref().filter(|s| !s.is_empty()) {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }

    /// Prefer configuration, fall back to the environment
    pub fn resolve(config: &StoreConfig) -> Result<Credentials, CredentialsError> {
        match Self::from_config(config) {
            Ok(credentials) => Ok(credentials),
            Err(config_err) => {
                tracing::debug!(reason = %config_err, "Falling back to environment credentials");
                Self::from_env()
            }
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
