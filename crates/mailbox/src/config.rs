//! Credential bundle and access token loading
//!
//! Credentials can be loaded from (in order of priority):
//! 1. JSON file (Google Cloud Console format, credentials.json in the config dir)
//! 2. Runtime environment variables
//!
//! The access token is read from the token file written by whichever tool
//! performed the OAuth consent flow. It is never refreshed or written here.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use config::ConfigFile;

use crate::error::ConfigError;

/// OAuth client credentials: id, secret and the registered redirect URIs.
///
/// Fields are private so a bundle can only exist once validated; the first
/// redirect URI is the one a session binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    redirect_uris: Vec<String>,
}

/// Google Cloud Console credential file format
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<InstalledCredentials>,
    web: Option<InstalledCredentials>,
}

#[derive(Deserialize)]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl Credentials {
    /// Build a credential bundle, rejecting empty fields
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uris: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.trim().is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if client_secret.trim().is_empty() {
            return Err(ConfigError::MissingClientSecret);
        }
        if redirect_uris.is_empty() {
            return Err(ConfigError::MissingRedirectUri);
        }

        Ok(Self {
            client_id,
            client_secret,
            redirect_uris,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn redirect_uris(&self) -> &[String] {
        &self.redirect_uris
    }

    /// The redirect URI a session binds to
    pub fn redirect_uri(&self) -> &str {
        // Non-empty by construction
        &self.redirect_uris[0]
    }

    /// Load credentials using the following priority:
    /// 1. JSON file (credentials.json in the config dir)
    /// 2. Runtime environment variables
    pub fn load() -> Result<Self> {
        if ConfigFile::Credentials.exists() {
            let creds: GoogleCredentialFile = ConfigFile::Credentials.load()?;
            return Self::from_credential_file(creds);
        }

        Self::from_env()
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: GoogleCredentialFile = config::read_json(path)?;
        Self::from_credential_file(creds)
    }

    /// Parse credentials from JSON string (Google Cloud Console format)
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(creds)
    }

    fn from_credential_file(creds: GoogleCredentialFile) -> Result<Self> {
        // Support both "installed" (desktop) and "web" credential types
        let installed = creds
            .installed
            .or(creds.web)
            .context("Credentials file missing 'installed' or 'web' section")?;

        Ok(Self::new(
            installed.client_id,
            installed.client_secret,
            installed.redirect_uris,
        )?)
    }

    /// Load credentials from GM_CLIENT_ID, GM_CLIENT_SECRET and GM_REDIRECT_URI
    pub fn from_env() -> Result<Self> {
        let client_id =
            std::env::var("GM_CLIENT_ID").context("GM_CLIENT_ID environment variable not set")?;
        let client_secret = std::env::var("GM_CLIENT_SECRET")
            .context("GM_CLIENT_SECRET environment variable not set")?;
        let redirect_uri = std::env::var("GM_REDIRECT_URI")
            .context("GM_REDIRECT_URI environment variable not set")?;

        Ok(Self::new(client_id, client_secret, vec![redirect_uri])?)
    }

    /// Default credentials file path (credentials.json in the config dir)
    pub fn default_path() -> Option<PathBuf> {
        ConfigFile::Credentials.path()
    }
}

/// A previously obtained OAuth access token, in the googleapis token file format.
///
/// Treated as opaque: the session only forwards `access_token` (and the
/// token type) on each request. Nothing here checks it against the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Expiry as milliseconds since epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl AccessToken {
    /// Wrap a bare access token string
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            scope: None,
            token_type: None,
            expiry_date: None,
        }
    }

    /// Token type for the Authorization header, "Bearer" unless stated
    pub fn token_type(&self) -> &str {
        self.token_type.as_deref().unwrap_or("Bearer")
    }

    /// Whether the stored expiry has passed. Tokens without expiry never expire.
    pub fn is_expired(&self) -> bool {
        self.expiry_date
            .is_some_and(|expiry| expiry <= Utc::now().timestamp_millis())
    }

    /// Load the token from token.json in the config dir
    pub fn load() -> Result<Self> {
        ConfigFile::Token.load()
    }

    /// Load the token from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::read_json(path)
    }

    /// Parse a token from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse token JSON")
    }

    /// Default token file path (token.json in the config dir)
    pub fn default_path() -> Option<PathBuf> {
        ConfigFile::Token.path()
    }
}
