//! Trello connector: exposes users, organizations and boards to the sync
//! pipeline.

pub mod boards;
pub mod organizations;
pub mod resource_types;
pub mod users;

use async_trait::async_trait;
use connector_core::{Annotations, Connector, ConnectorMetadata, ResourceSyncer};
use std::sync::Arc;
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::{TrelloApi, create_trello_client};
use crate::config::TrelloConfig;
use crate::error::{TrelloError, TrelloResult};

pub use boards::{BoardPermission, BoardSyncer, evaluate_membership};
pub use organizations::OrganizationSyncer;
pub use users::UserSyncer;

/// Resource family a grant identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum GrantKind {
    Org,
    Board
}

/// `"<kind>-grant:<resource id>:<member id>:<entitlement slug>"`
pub fn grant_identifier(kind: GrantKind, resource_id: &str, member_id: &str, slug: &str) -> String {
    format!("{kind}-grant:{resource_id}:{member_id}:{slug}")
}

pub struct TrelloConnector {
    client: Arc<dyn TrelloApi>,
    users: Arc<UserSyncer>,
    organizations: Arc<OrganizationSyncer>,
    boards: Arc<BoardSyncer>
}

impl TrelloConnector {
    pub fn new(config: &TrelloConfig) -> TrelloResult<Self> {
        Ok(Self::with_client(create_trello_client(config)?))
    }

    pub fn with_client(client: Arc<dyn TrelloApi>) -> Self {
        Self {
            users: Arc::new(UserSyncer::new(client.clone())),
            organizations: Arc::new(OrganizationSyncer::new(client.clone())),
            boards: Arc::new(BoardSyncer::new(client.clone())),
            client
        }
    }
}

#[async_trait]
impl Connector for TrelloConnector {
    type Error = TrelloError;

    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            display_name: "Trello Connector".to_string(),
            description: "Connector to sync users, organizations and boards from Trello"
                .to_string()
        }
    }

    /// Fetches every configured organization; any failure means the
    /// credentials or organization list are unusable.
    async fn validate(&self, cancel: &CancellationToken) -> TrelloResult<Annotations> {
        let response = self.client.list_organizations(cancel).await?;
        info!(
            organizations = response.data.len(),
            "Validated Trello credentials"
        );
        Ok(response.annotations)
    }

    fn resource_syncers(&self) -> Vec<Arc<dyn ResourceSyncer<Error = TrelloError>>> {
        let users: Arc<dyn ResourceSyncer<Error = TrelloError>> = self.users.clone();
        let organizations: Arc<dyn ResourceSyncer<Error = TrelloError>> =
            self.organizations.clone();
        let boards: Arc<dyn ResourceSyncer<Error = TrelloError>> = self.boards.clone();
        vec![users, organizations, boards]
    }
}
