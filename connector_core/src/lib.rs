//! # Connector Core
//!
//! Shared vocabulary between governance connectors and the sync pipeline
//! that drives them.
//!
//! This crate provides:
//! - Resource, entitlement and grant value objects with their builders
//! - Annotations (rate-limit descriptors, stable external identifiers)
//! - Page tokens and page envelopes
//! - The `ResourceSyncer` and `Connector` traits
//! - A sync driver that walks every syncer and collects a snapshot

pub mod annotations;
pub mod error;
pub mod pagination;
pub mod sync;
pub mod traits;
pub mod types;

pub use annotations::{Annotation, Annotations, RateLimitDescription, RateLimitStatus};
pub use error::{CoreError, CoreResult};
pub use pagination::{Page, PageToken};
pub use sync::{SyncDriver, SyncFailure, SyncReport, SyncSnapshot};
pub use traits::{Connector, ConnectorMetadata, ResourceSyncer};
pub use types::{
    Entitlement, EntitlementPurpose, GroupTrait, Grant, Profile, Resource, ResourceId,
    ResourceTrait, ResourceTraits, ResourceType, UserStatus, UserTrait
};
