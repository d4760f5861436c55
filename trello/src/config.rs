use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::error::{TrelloError, TrelloResult};

pub const DEFAULT_BASE_URL: &str = "https://api.trello.com/1";
/// Trello caps board listings at this many items per page.
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct TrelloConfig {
    #[validate(length(min = 1, message = "api_key is required"))]
    pub api_key: String,
    #[validate(length(min = 1, message = "api_token is required"))]
    pub api_token: String,
    /// Organization slugs or identifiers that bound the sync scope.
    #[validate(custom(function = "validate_organizations"))]
    pub organizations: Vec<String>,
    #[serde(default = "default_base_url")]
    #[validate(url)]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 50))]
    pub page_size: u32,
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1))]
    pub timeout_seconds: u64
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_timeout_seconds() -> u64 {
    30
}

fn validate_organizations(organizations: &Vec<String>) -> Result<(), ValidationError> {
    if organizations.is_empty() {
        return Err(ValidationError::new("organizations_required"));
    }
    if organizations.iter().any(|org| org.trim().is_empty()) {
        return Err(ValidationError::new("organization_blank"));
    }
    Ok(())
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_token: String::new(),
            organizations: Vec::new(),
            base_url: default_base_url(),
            page_size: default_page_size(),
            timeout_seconds: default_timeout_seconds()
        }
    }
}

impl std::fmt::Debug for TrelloConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrelloConfig")
            .field("api_key", &"***")
            .field("api_token", &"***")
            .field("organizations", &self.organizations)
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl TrelloConfig {
    pub fn new(
        api_key: impl Into<String>,
        api_token: impl Into<String>,
        organizations: Vec<String>
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_token: api_token.into(),
            organizations,
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn from_toml_str(content: &str) -> TrelloResult<Self> {
        toml::from_str(content).map_err(|e| TrelloError::ConfigError(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> TrelloResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrelloError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate_config(&self) -> TrelloResult<()> {
        self.validate()
            .map_err(|e| TrelloError::ConfigError(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_credentials_fail_validation() {
        let config = TrelloConfig::new("", "token", vec!["acme".to_string()]);
        let err = config.validate_config().unwrap_err();
        assert!(err.to_string().contains("api_key"));

        let config = TrelloConfig::new("key", "token", Vec::new());
        assert!(config.validate_config().is_err());

        let config = TrelloConfig::new("key", "token", vec!["  ".to_string()]);
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_valid_config() {
        let config = TrelloConfig::new("key", "token", vec!["acme".to_string()]);
        assert!(config.validate_config().is_ok());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_page_size_is_capped() {
        let mut config = TrelloConfig::new("key", "token", vec!["acme".to_string()]);
        config.page_size = 51;
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = TrelloConfig::new("secret-key", "secret-token", vec!["acme".to_string()]);
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("acme"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_key = "key"
api_token = "token"
organizations = ["acme", "globex"]
timeout_seconds = 10
"#
        )
        .unwrap();

        let config = TrelloConfig::from_file(file.path()).unwrap();
        assert_eq!(config.organizations, vec!["acme", "globex"]);
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_from_toml_rejects_malformed_input() {
        let err = TrelloConfig::from_toml_str("api_key = ").unwrap_err();
        assert!(matches!(err, TrelloError::ConfigError(_)));
    }
}
