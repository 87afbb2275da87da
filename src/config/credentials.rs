//! Credential discovery.
//!
//! Key files are tried in the order given; the first one that parses wins.
//! A missing file is skipped quietly, an unreadable or malformed one is
//! skipped with a warning. When no file yields credentials, the environment
//! is used.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::SweepError;

pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "app";

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_identity_base_url() -> String {
    DEFAULT_IDENTITY_BASE_URL.to_string()
}

#[derive(Clone, Deserialize)]
pub struct IdentityCredentials {
    pub api_key: String,
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub project_id: String,
    pub mongodb_uri: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub identity: Option<IdentityCredentials>,
}

// Secrets stay out of logs and panics.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project_id", &self.project_id)
            .field("mongodb_uri", &"<redacted>")
            .field("database", &self.database)
            .field("identity", &self.identity.as_ref().map(|i| &i.base_url))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    File(PathBuf),
    Environment,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::File(path) => write!(f, "key file {}", path.display()),
            CredentialSource::Environment => write!(f, "environment"),
        }
    }
}

impl Credentials {
    pub fn load(key_files: &[PathBuf]) -> Result<(Self, CredentialSource), SweepError> {
        Self::load_with(key_files, |key| env::var(key).ok())
    }

    pub fn load_with<F>(
        key_files: &[PathBuf],
        lookup: F,
    ) -> Result<(Self, CredentialSource), SweepError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for path in key_files {
            if !path.exists() {
                debug!(path = %path.display(), "key file not present");
                continue;
            }
            match Self::from_file(path) {
                Ok(credentials) => {
                    info!(path = %path.display(), "using key file");
                    return Ok((credentials, CredentialSource::File(path.clone())));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping key file"),
            }
        }

        let credentials = Self::from_lookup(lookup)?;
        info!("using credentials from environment");
        Ok((credentials, CredentialSource::Environment))
    }

    pub fn from_file(path: &Path) -> Result<Self, SweepError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| SweepError::Config(format!("{}: {}", path.display(), e)))?;
        let credentials: Credentials = serde_json::from_str(&raw)
            .map_err(|e| SweepError::Config(format!("{}: {}", path.display(), e)))?;

        if credentials.project_id.trim().is_empty() || credentials.mongodb_uri.trim().is_empty() {
            return Err(SweepError::Config(format!(
                "{}: project_id and mongodb_uri must not be empty",
                path.display()
            )));
        }
        Ok(credentials)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SweepError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                SweepError::Connection(format!("{} is not set and no key file was usable", key))
            })
        };

        let mongodb_uri = required("MONGODB_URI")?;
        let project_id = required("PROJECT_ID")?;
        let database = lookup("MONGODB_DATABASE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(default_database);

        let identity = lookup("IDENTITY_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .map(|api_key| IdentityCredentials {
                api_key,
                base_url: lookup("IDENTITY_BASE_URL").unwrap_or_else(default_identity_base_url),
            });

        Ok(Self {
            project_id,
            mongodb_uri,
            database,
            identity,
        })
    }
}
