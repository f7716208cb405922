//! Client configuration
//!
//! Connection settings for the store collaborator plus the field names the
//! façade stamps timestamps into.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{ClientError, ClientResult};

/// Environment variable holding the store URL
pub const ENV_URL: &str = "AEROKV_URL";

/// Environment variable holding the store access token
pub const ENV_TOKEN: &str = "AEROKV_TOKEN";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Store location, interpreted by the connector (default: none)
    #[serde(default)]
    pub url: Option<String>,

    /// Access token handed to the connector (default: none)
    #[serde(default)]
    pub access_token: Option<String>,

    /// Page size applied by `findMany` when the caller passes no `take`
    #[serde(default)]
    pub default_take: Option<usize>,

    /// Field stamped on create when the model declares it (default: "createdAt")
    #[serde(default = "default_created_at_field")]
    pub created_at_field: String,

    /// Field stamped on update when the model declares it (default: "updatedAt")
    #[serde(default = "default_updated_at_field")]
    pub updated_at_field: String,
}

fn default_created_at_field() -> String {
    "createdAt".to_string()
}

fn default_updated_at_field() -> String {
    "updatedAt".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: None,
            access_token: None,
            default_take: None,
            created_at_field: default_created_at_field(),
            updated_at_field: default_updated_at_field(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ClientError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: ClientConfig = serde_json::from_str(&content)
            .map_err(|e| ClientError::InvalidConfig(format!("invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `AEROKV_URL` and `AEROKV_TOKEN`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            url: lookup(ENV_URL),
            access_token: lookup(ENV_TOKEN),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_default_take(mut self, take: usize) -> Self {
        self.default_take = Some(take);
        self
    }

    fn validate(&self) -> ClientResult<()> {
        if self.created_at_field.is_empty() || self.updated_at_field.is_empty() {
            return Err(ClientError::InvalidConfig(
                "timestamp field names must not be empty".into(),
            ));
        }
        if self.default_take == Some(0) {
            return Err(ClientError::InvalidConfig("default_take must be > 0".into()));
        }
        Ok(())
    }
}
