use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::annotations::Annotations;
use crate::pagination::{Page, PageToken};
use crate::types::{Entitlement, Grant, Resource, ResourceId, ResourceType};

/// Capability implemented once per resource type a connector exposes.
///
/// Every call receives the cancellation token of the running sync pass and
/// must stop at its next network call once the token is cancelled.
#[async_trait]
pub trait ResourceSyncer: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn resource_type(&self) -> &ResourceType;

    async fn list(
        &self,
        cancel: &CancellationToken,
        parent: Option<&ResourceId>,
        token: &PageToken
    ) -> Result<Page<Resource>, Self::Error>;

    async fn entitlements(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        token: &PageToken
    ) -> Result<Page<Entitlement>, Self::Error>;

    async fn grants(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        token: &PageToken
    ) -> Result<Page<Grant>, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorMetadata {
    pub display_name: String,
    pub description: String
}

#[async_trait]
pub trait Connector: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn metadata(&self) -> ConnectorMetadata;

    /// Exercises the configured credentials against the upstream API.
    async fn validate(&self, cancel: &CancellationToken) -> Result<Annotations, Self::Error>;

    fn resource_syncers(&self) -> Vec<Arc<dyn ResourceSyncer<Error = Self::Error>>>;
}
