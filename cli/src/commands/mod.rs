pub mod resource_types;
pub mod sync;
pub mod validate;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use trello_connector::TrelloConfig;

#[derive(Parser)]
#[command(
    name = "trello-sync",
    author,
    version,
    about = "Sync users, organizations and boards from Trello",
    long_about = "Reads Trello organizations, boards and memberships and emits the resources, \
                  entitlements and grants they imply.\n\nSettings come from a TOML file, \
                  TRELLO_* environment variables and flags, in increasing precedence."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run a full sync pass and print the result")]
    Sync(sync::SyncArgs),

    #[command(about = "Check the credentials against the configured organizations")]
    Validate(validate::ValidateArgs),

    #[command(about = "List the resource types the connector exposes")]
    ResourceTypes(resource_types::ResourceTypesArgs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json
}

#[derive(Args)]
pub struct GlobalArgs {
    /// TOML configuration file
    #[arg(long, short, global = true, env = "TRELLO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Trello API key
    #[arg(long, global = true, env = "TRELLO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Trello API token
    #[arg(long, global = true, env = "TRELLO_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Organization ids or slugs, comma separated
    #[arg(long, global = true, env = "TRELLO_ORGANIZATIONS", value_delimiter = ',')]
    pub organizations: Option<Vec<String>>,

    /// Trello API base URL
    #[arg(long, global = true, env = "TRELLO_BASE_URL")]
    pub base_url: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t, env = "TRELLO_LOG_FORMAT")]
    pub log_format: LogFormat
}

impl GlobalArgs {
    /// File settings first, then environment and flags on top.
    pub fn resolve_config(&self) -> Result<TrelloConfig> {
        let mut config = match &self.config {
            Some(path) => TrelloConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => TrelloConfig::default()
        };

        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(api_token) = &self.api_token {
            config.api_token = api_token.clone();
        }
        if let Some(organizations) = &self.organizations {
            config.organizations = organizations
                .iter()
                .map(|org| org.trim().to_string())
                .filter(|org| !org.is_empty())
                .collect();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }

        config.validate_config()?;
        Ok(config)
    }
}
