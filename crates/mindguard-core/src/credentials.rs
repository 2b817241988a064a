//! Reporter credentials: bearer token and base URL.
//!
//! Both values are persisted in the key-value store and cached after the
//! first read. An absent or empty token means the device is unauthenticated.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::error::{CoreError, StorageError, ValidationError};
use crate::storage::KeyValueStore;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const BASE_URL_KEY: &str = "base_url";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: Option<String>,
    pub base_url: String,
}

impl Credentials {
    /// Token to present, if any non-empty one is stored.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.bearer().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub struct CredentialStore {
    kv: Arc<dyn KeyValueStore>,
    default_base_url: String,
    cached: RwLock<Credentials>,
}

impl CredentialStore {
    /// Read the stored token and base URL override.
    pub fn load(
        kv: Arc<dyn KeyValueStore>,
        default_base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let default_base_url = default_base_url.into();
        let token = kv.get(AUTH_TOKEN_KEY)?;
        let base_url = kv
            .get(BASE_URL_KEY)?
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| default_base_url.clone());
        Ok(Self {
            kv,
            default_base_url,
            cached: RwLock::new(Credentials { token, base_url }),
        })
    }

    pub fn snapshot(&self) -> Credentials {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store a token. An empty token is stored as-is and reads back as
    /// unauthenticated.
    pub fn set_token(&self, token: &str) -> Result<(), CoreError> {
        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        self.kv.set(AUTH_TOKEN_KEY, token)?;
        cached.token = Some(token.to_string());
        info!(authenticated = !token.is_empty(), "Auth token updated");
        Ok(())
    }

    pub fn clear_token(&self) -> Result<(), CoreError> {
        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        self.kv.remove(AUTH_TOKEN_KEY)?;
        cached.token = None;
        info!("Auth token cleared");
        Ok(())
    }

    /// Override the base URL. An empty value restores the configured default.
    ///
    /// # Errors
    /// Rejects anything that is not an absolute http(s) URL.
    pub fn set_base_url(&self, url: &str) -> Result<(), CoreError> {
        let trimmed = url.trim();
        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);

        if trimmed.is_empty() {
            self.kv.remove(BASE_URL_KEY)?;
            cached.base_url = self.default_base_url.clone();
            info!(base_url = %cached.base_url, "Base URL reset to default");
            return Ok(());
        }

        validate_base_url(trimmed)?;
        let normalized = trimmed.trim_end_matches('/');
        self.kv.set(BASE_URL_KEY, normalized)?;
        cached.base_url = normalized.to_string();
        info!(base_url = %normalized, "Base URL updated");
        Ok(())
    }
}

fn validate_base_url(raw: &str) -> Result<(), ValidationError> {
    let invalid = |message: String| ValidationError::InvalidBaseUrl {
        url: raw.to_string(),
        message,
    };
    let parsed = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(()),
        "http" | "https" => Err(invalid("missing host".to_string())),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}
