use async_trait::async_trait;
use connector_core::{
    Annotation, Entitlement, GroupTrait, Grant, Page, PageToken, Profile, Resource, ResourceId,
    ResourceSyncer, ResourceType
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::users::user_resource;
use super::{GrantKind, grant_identifier, resource_types};
use crate::client::{Organization, Role, TrelloApi};
use crate::error::{TrelloError, TrelloResult};

pub struct OrganizationSyncer {
    client: Arc<dyn TrelloApi>
}

impl OrganizationSyncer {
    pub fn new(client: Arc<dyn TrelloApi>) -> Self {
        Self { client }
    }
}

pub fn organization_resource(organization: &Organization) -> TrelloResult<Resource> {
    let mut profile = Profile::new();
    profile.insert("organization_id".to_string(), json!(organization.id));
    profile.insert("display_name".to_string(), json!(organization.display_name));
    profile.insert("name".to_string(), json!(organization.name));
    profile.insert("url".to_string(), json!(organization.url));

    let resource = Resource::new_group(
        &organization.display_name,
        &resource_types::ORGANIZATION,
        &organization.id,
        GroupTrait::with_profile(profile)
    )?;
    Ok(resource)
}

/// One entitlement per recognized member type.
pub fn organization_entitlements(resource: &Resource) -> Vec<Entitlement> {
    Role::RECOGNIZED
        .iter()
        .map(|role| {
            Entitlement::permission(resource, role.as_str())
                .with_grantable_to(&resource_types::USER)
                .with_description(format!(
                    "Member type {} for organization {} in Trello",
                    role, resource.display_name
                ))
                .with_display_name(format!(
                    "{} Organization {}",
                    resource.display_name, role
                ))
                .with_stable_key(role.as_str())
        })
        .collect()
}

#[async_trait]
impl ResourceSyncer for OrganizationSyncer {
    type Error = TrelloError;

    fn resource_type(&self) -> &ResourceType {
        &resource_types::ORGANIZATION
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        _parent: Option<&ResourceId>,
        _token: &PageToken
    ) -> TrelloResult<Page<Resource>> {
        let response = self.client.list_organizations(cancel).await?;
        let resources = response
            .data
            .iter()
            .map(organization_resource)
            .collect::<TrelloResult<Vec<_>>>()?;

        info!(count = resources.len(), "Listed Trello organizations");
        Ok(Page::new(resources).with_annotations(response.annotations))
    }

    async fn entitlements(
        &self,
        _cancel: &CancellationToken,
        resource: &Resource,
        _token: &PageToken
    ) -> TrelloResult<Page<Entitlement>> {
        resource.expect_type(&resource_types::ORGANIZATION)?;
        Ok(Page::new(organization_entitlements(resource)))
    }

    /// One grant per organization membership, on the entitlement named after
    /// the member type. Members with an unrecognized type get no grant.
    async fn grants(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        _token: &PageToken
    ) -> TrelloResult<Page<Grant>> {
        resource.expect_type(&resource_types::ORGANIZATION)?;
        let organization_id = &resource.id.resource;

        let response = self
            .client
            .list_memberships_by_org(cancel, organization_id)
            .await?;

        let mut grants = Vec::with_capacity(response.data.len());
        for member in &response.data {
            let role = match &member.member_type {
                Some(role) if role.is_recognized() => role,
                other => {
                    warn!(
                        organization_id = %organization_id,
                        member_id = %member.grant_member_id(),
                        member_type = ?other.as_ref().map(Role::as_str),
                        "Skipping organization member with unrecognized member type"
                    );
                    continue;
                }
            };

            let principal = user_resource(member, Some(&resource.id))?;
            let grant = Grant::new(resource, role.as_str(), &principal.id).with_annotation(
                Annotation::v1_identifier(grant_identifier(
                    GrantKind::Org,
                    organization_id,
                    member.grant_member_id(),
                    role.as_str()
                ))
            );
            grants.push(grant);
        }

        Ok(Page::new(grants).with_annotations(response.annotations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTrello;

    fn acme() -> Resource {
        organization_resource(&crate::testing::organization("org1", "Acme")).unwrap()
    }

    #[test]
    fn test_organization_entitlements() {
        let entitlements = organization_entitlements(&acme());
        let slugs: Vec<&str> = entitlements.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, ["admin", "normal", "observer"]);

        let admin = &entitlements[0];
        assert_eq!(admin.id, "organization:org1:admin");
        assert_eq!(admin.display_name, "Acme Organization admin");
        assert_eq!(
            admin.description,
            "Member type admin for organization Acme in Trello"
        );
        assert_eq!(admin.grantable_to, ["user"]);
    }

    #[tokio::test]
    async fn test_grants_skip_unrecognized_roles() {
        let syncer = OrganizationSyncer::new(Arc::new(FakeTrello::scenario()));
        let page = syncer
            .grants(&CancellationToken::new(), &acme(), &PageToken::first())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].slug, "admin");
        assert_eq!(page.items[0].principal.to_string(), "user:u1");
        assert_eq!(page.items[0].external_id(), Some("org-grant:org1:u1:admin"));
        assert_eq!(page.items[1].external_id(), Some("org-grant:org1:u2:normal"));
    }

    #[tokio::test]
    async fn test_list_one_resource_per_configured_organization() {
        let mut fake = FakeTrello::scenario();
        fake.organization_ids = vec!["org2".to_string(), "org1".to_string()];
        fake.organizations.insert(
            "org2".to_string(),
            crate::testing::organization("org2", "Globex")
        );

        let syncer = OrganizationSyncer::new(Arc::new(fake));
        let page = syncer
            .list(&CancellationToken::new(), None, &PageToken::first())
            .await
            .unwrap();
        let names: Vec<&str> = page.items.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["Globex", "Acme"]);
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn test_rejects_foreign_resource() {
        let syncer = OrganizationSyncer::new(Arc::new(FakeTrello::scenario()));
        let user = user_resource(&crate::testing::user("u1", "alice", "Alice"), None).unwrap();
        let err = syncer
            .entitlements(&CancellationToken::new(), &user, &PageToken::first())
            .await
            .unwrap_err();
        assert!(matches!(err, TrelloError::ResourceError(_)));
    }
}
