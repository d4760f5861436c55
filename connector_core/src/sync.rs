//! Drives every registered `ResourceSyncer` through one full pass and
//! collects the resulting resources, entitlements and grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::annotations::RateLimitDescription;
use crate::pagination::{Page, PageToken};
use crate::traits::ResourceSyncer;
use crate::types::{Entitlement, Grant, Resource, ResourceType};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub resource_types: Vec<ResourceType>,
    pub resources: Vec<Resource>,
    pub entitlements: Vec<Entitlement>,
    pub grants: Vec<Grant>
}

impl SyncSnapshot {
    fn extend(&mut self, other: SyncSnapshot) {
        self.resources.extend(other.resources);
        self.entitlements.extend(other.entitlements);
        self.grants.extend(other.grants);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub resources_by_type: BTreeMap<String, u32>,
    pub entitlements_synced: u32,
    pub grants_synced: u32,
    pub rate_limit: Option<RateLimitDescription>,
    pub errors: Vec<SyncFailure>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFailure {
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub error: String,
    pub timestamp: DateTime<Utc>
}

impl SyncFailure {
    fn new(resource_type: &str, resource_id: Option<&str>, error: impl ToString) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            resource_id: resource_id.map(str::to_string),
            error: error.to_string(),
            timestamp: Utc::now()
        }
    }
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            ..Default::default()
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn resources_synced(&self) -> u32 {
        self.resources_by_type.values().sum()
    }

    fn record(&mut self, resource_type: &str, staged: &SyncSnapshot) {
        *self
            .resources_by_type
            .entry(resource_type.to_string())
            .or_default() += staged.resources.len() as u32;
        self.entitlements_synced += staged.entitlements.len() as u32;
        self.grants_synced += staged.grants.len() as u32;
    }
}

pub struct SyncDriver<E>
where
    E: std::error::Error + Send + Sync + 'static
{
    syncers: Vec<Arc<dyn ResourceSyncer<Error = E>>>
}

impl<E> SyncDriver<E>
where
    E: std::error::Error + Send + Sync + 'static
{
    pub fn new(syncers: Vec<Arc<dyn ResourceSyncer<Error = E>>>) -> Self {
        Self { syncers }
    }

    /// Runs one pass over every resource type. A failure aborts the pass for
    /// that resource type only; its partial results are discarded.
    pub async fn run(&self, cancel: &CancellationToken) -> (SyncSnapshot, SyncReport) {
        let mut snapshot = SyncSnapshot::default();
        let mut report = SyncReport::new();
        info!(resource_types = self.syncers.len(), "Starting sync pass");

        for syncer in &self.syncers {
            let resource_type = syncer.resource_type().clone();
            snapshot.resource_types.push(resource_type.clone());

            if cancel.is_cancelled() {
                report
                    .errors
                    .push(SyncFailure::new(&resource_type.id, None, "sync cancelled"));
                break;
            }

            let mut staged = SyncSnapshot::default();
            match Self::sync_resource_type(syncer.as_ref(), cancel, &mut staged, &mut report).await
            {
                Ok(()) => {
                    report.record(&resource_type.id, &staged);
                    snapshot.extend(staged);
                }
                Err(failure) => {
                    warn!(
                        resource_type = %failure.resource_type,
                        resource_id = ?failure.resource_id,
                        error = %failure.error,
                        "Resource type sync failed"
                    );
                    report.errors.push(failure);
                }
            }
        }

        report.complete();
        info!(
            resources = report.resources_synced(),
            entitlements = report.entitlements_synced,
            grants = report.grants_synced,
            errors = report.errors.len(),
            "Sync pass completed"
        );

        (snapshot, report)
    }

    async fn sync_resource_type(
        syncer: &dyn ResourceSyncer<Error = E>,
        cancel: &CancellationToken,
        staged: &mut SyncSnapshot,
        report: &mut SyncReport
    ) -> Result<(), SyncFailure> {
        let type_id = syncer.resource_type().id.clone();

        let resources = drain_pages(
            |token| async move { syncer.list(cancel, None, &token).await },
            report
        )
        .await
        .map_err(|e| SyncFailure::new(&type_id, None, e))?;
        debug!(resource_type = %type_id, count = resources.len(), "Listed resources");

        for resource in &resources {
            let entitlements = drain_pages(
                |token| async move { syncer.entitlements(cancel, resource, &token).await },
                report
            )
            .await
            .map_err(|e| SyncFailure::new(&type_id, Some(&resource.id.resource), e))?;
            staged.entitlements.extend(entitlements);

            let grants = drain_pages(
                |token| async move { syncer.grants(cancel, resource, &token).await },
                report
            )
            .await
            .map_err(|e| SyncFailure::new(&type_id, Some(&resource.id.resource), e))?;
            staged.grants.extend(grants);
        }

        staged.resources = resources;
        Ok(())
    }
}

async fn drain_pages<T, E, F, Fut>(mut fetch: F, report: &mut SyncReport) -> Result<Vec<T>, E>
where
    F: FnMut(PageToken) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>
{
    let mut items = Vec::new();
    let mut token = PageToken::first();

    loop {
        let page = fetch(token.clone()).await?;
        if let Some(rate_limit) = page.annotations.rate_limit() {
            report.rate_limit = Some(rate_limit.clone());
        }
        items.extend(page.items);

        match page.next_page_token {
            Some(next) if token.token.as_deref() == Some(next.as_str()) => {
                warn!(token = %next, "Page token repeated, stopping pagination");
                break;
            }
            Some(next) => token = PageToken::resume(next),
            None => break
        }
    }

    Ok(items)
}
