use async_trait::async_trait;
use connector_core::{
    Entitlement, Grant, Page, PageToken, Profile, Resource, ResourceId, ResourceSyncer,
    ResourceType, UserStatus, UserTrait
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::resource_types;
use crate::client::{TrelloApi, User};
use crate::error::{TrelloError, TrelloResult};

pub struct UserSyncer {
    client: Arc<dyn TrelloApi>
}

impl UserSyncer {
    pub fn new(client: Arc<dyn TrelloApi>) -> Self {
        Self { client }
    }
}

/// Builds the user resource for a Trello member. `member_type` is only
/// meaningful when the record was joined with a membership.
pub fn user_resource(user: &User, parent: Option<&ResourceId>) -> TrelloResult<Resource> {
    let mut profile = Profile::new();
    profile.insert("user_id".to_string(), json!(user.id));
    profile.insert("username".to_string(), json!(user.username));
    profile.insert("full_name".to_string(), json!(user.full_name));
    profile.insert(
        "member_type".to_string(),
        json!(user.member_type.as_ref().map_or("", |role| role.as_str()))
    );

    let user_trait = UserTrait::new()
        .with_profile(profile)
        .with_status(UserStatus::Enabled)
        .with_login(user.username.clone());

    let resource = Resource::new_user(&user.username, &resource_types::USER, &user.id, user_trait)?
        .with_parent(parent.cloned());
    Ok(resource)
}

#[async_trait]
impl ResourceSyncer for UserSyncer {
    type Error = TrelloError;

    fn resource_type(&self) -> &ResourceType {
        &resource_types::USER
    }

    /// Members of every configured organization. Trello does not paginate
    /// this listing, so the page is always the last one.
    async fn list(
        &self,
        cancel: &CancellationToken,
        _parent: Option<&ResourceId>,
        _token: &PageToken
    ) -> TrelloResult<Page<Resource>> {
        let response = self.client.list_users(cancel).await?;
        let resources = response
            .data
            .iter()
            .map(|user| user_resource(user, None))
            .collect::<TrelloResult<Vec<_>>>()?;

        info!(count = resources.len(), "Listed Trello users");
        Ok(Page::new(resources).with_annotations(response.annotations))
    }

    async fn entitlements(
        &self,
        _cancel: &CancellationToken,
        _resource: &Resource,
        _token: &PageToken
    ) -> TrelloResult<Page<Entitlement>> {
        Ok(Page::empty())
    }

    async fn grants(
        &self,
        _cancel: &CancellationToken,
        _resource: &Resource,
        _token: &PageToken
    ) -> TrelloResult<Page<Grant>> {
        Ok(Page::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Role;
    use crate::testing::{FakeTrello, user};
    use connector_core::ResourceTraits;

    #[test]
    fn test_user_resource_shape() {
        let mut record = user("u1", "alice", "Alice Liddell");
        record.member_type = Some(Role::Admin);

        let resource = user_resource(&record, None).unwrap();
        assert_eq!(resource.id.to_string(), "user:u1");
        assert_eq!(resource.display_name, "alice");
        assert_eq!(resource.parent_resource_id, None);

        let ResourceTraits::User(user_trait) = &resource.traits else {
            panic!("expected a user trait");
        };
        assert_eq!(user_trait.login.as_deref(), Some("alice"));
        assert_eq!(user_trait.status, UserStatus::Enabled);
        assert_eq!(user_trait.profile["full_name"], json!("Alice Liddell"));
        assert_eq!(user_trait.profile["member_type"], json!("admin"));
    }

    #[test]
    fn test_user_without_id_is_rejected() {
        let record = user("", "ghost", "");
        assert!(matches!(
            user_resource(&record, None),
            Err(TrelloError::ResourceError(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_single_page_without_entitlements() {
        let syncer = UserSyncer::new(Arc::new(FakeTrello::scenario()));
        let cancel = CancellationToken::new();

        let page = syncer.list(&cancel, None, &PageToken::first()).await.unwrap();
        assert_eq!(page.items.len(), 3);
        assert!(page.is_last());

        let alice = &page.items[0];
        let entitlements = syncer
            .entitlements(&cancel, alice, &PageToken::first())
            .await
            .unwrap();
        assert!(entitlements.items.is_empty());
        let grants = syncer.grants(&cancel, alice, &PageToken::first()).await.unwrap();
        assert!(grants.items.is_empty());
    }
}
