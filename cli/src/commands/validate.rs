use anyhow::Result;
use clap::Args;
use connector_core::Connector;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use trello_connector::TrelloConnector;

use super::GlobalArgs;
use crate::output;

#[derive(Args)]
pub struct ValidateArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool
}

pub async fn run(global: &GlobalArgs, args: ValidateArgs) -> Result<()> {
    let config = global.resolve_config()?;
    let connector = TrelloConnector::new(&config)?;
    let metadata = connector.metadata();

    let annotations = connector.validate(&CancellationToken::new()).await?;

    if args.json {
        return output::json(&json!({
            "connector": metadata,
            "organizations": config.organizations,
            "valid": true,
            "annotations": annotations
        }));
    }

    output::success(&format!(
        "{}: credentials accepted for {} organization(s)",
        metadata.display_name,
        config.organizations.len()
    ));
    if let Some(rate_limit) = annotations.rate_limit() {
        output::rate_limit(rate_limit);
        if rate_limit.is_overlimit() {
            output::warn("Trello reports the rate limit as exhausted");
        }
    }
    Ok(())
}
