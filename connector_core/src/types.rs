use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumString};

use crate::annotations::{Annotation, Annotations};
use crate::error::{CoreError, CoreResult};

/// Free-form profile attached to user and group traits.
pub type Profile = BTreeMap<String, serde_json::Value>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourceTrait {
    User,
    Group,
    Role,
    App
}

/// Descriptor of a kind of resource a connector exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: String,
    pub display_name: String,
    pub traits: Vec<ResourceTrait>
}

impl ResourceType {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        traits: Vec<ResourceTrait>
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            traits
        }
    }

    pub fn has_trait(&self, resource_trait: ResourceTrait) -> bool {
        self.traits.contains(&resource_trait)
    }

    fn require_trait(&self, resource_trait: ResourceTrait) -> CoreResult<()> {
        if self.has_trait(resource_trait) {
            Ok(())
        } else {
            Err(CoreError::MissingTrait {
                resource_type: self.id.clone(),
                required: resource_trait.to_string()
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub resource_type: String,
    pub resource: String
}

impl ResourceId {
    pub fn new(resource_type: &ResourceType, resource: impl Into<String>) -> CoreResult<Self> {
        let resource = resource.into();
        if resource.is_empty() {
            return Err(CoreError::MissingIdentifier {
                kind: resource_type.id.clone()
            });
        }
        Ok(Self {
            resource_type: resource_type.id.clone(),
            resource
        })
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.resource)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Enabled,
    Disabled,
    Deleted
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserTrait {
    pub profile: Profile,
    pub status: UserStatus,
    pub login: Option<String>
}

impl UserTrait {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupTrait {
    pub profile: Profile
}

impl GroupTrait {
    pub fn with_profile(profile: Profile) -> Self {
        Self { profile }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceTraits {
    User(UserTrait),
    Group(GroupTrait)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub display_name: String,
    pub parent_resource_id: Option<ResourceId>,
    pub traits: ResourceTraits
}

impl Resource {
    pub fn new_user(
        display_name: impl Into<String>,
        resource_type: &ResourceType,
        id: impl Into<String>,
        user: UserTrait
    ) -> CoreResult<Self> {
        resource_type.require_trait(ResourceTrait::User)?;
        Ok(Self {
            id: ResourceId::new(resource_type, id)?,
            display_name: display_name.into(),
            parent_resource_id: None,
            traits: ResourceTraits::User(user)
        })
    }

    pub fn new_group(
        display_name: impl Into<String>,
        resource_type: &ResourceType,
        id: impl Into<String>,
        group: GroupTrait
    ) -> CoreResult<Self> {
        resource_type.require_trait(ResourceTrait::Group)?;
        Ok(Self {
            id: ResourceId::new(resource_type, id)?,
            display_name: display_name.into(),
            parent_resource_id: None,
            traits: ResourceTraits::Group(group)
        })
    }

    pub fn with_parent(mut self, parent: Option<ResourceId>) -> Self {
        self.parent_resource_id = parent;
        self
    }

    /// Rejects resources that were not produced for `resource_type`.
    pub fn expect_type(&self, resource_type: &ResourceType) -> CoreResult<()> {
        if self.id.resource_type == resource_type.id {
            Ok(())
        } else {
            Err(CoreError::UnexpectedResourceType {
                expected: resource_type.id.clone(),
                actual: self.id.resource_type.clone()
            })
        }
    }

    pub fn profile(&self) -> &Profile {
        match &self.traits {
            ResourceTraits::User(user) => &user.profile,
            ResourceTraits::Group(group) => &group.profile
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntitlementPurpose {
    #[default]
    Permission,
    Assignment
}

/// An abstract permission exposed by a resource, keyed by `(resource, slug)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: String,
    pub resource: ResourceId,
    pub slug: String,
    pub purpose: EntitlementPurpose,
    pub display_name: String,
    pub description: String,
    pub grantable_to: Vec<String>,
    /// Connector-defined key that does not change with the display label.
    pub stable_key: Option<String>
}

impl Entitlement {
    pub fn permission(resource: &Resource, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: entitlement_id(&resource.id, &slug),
            resource: resource.id.clone(),
            display_name: slug.clone(),
            slug,
            purpose: EntitlementPurpose::Permission,
            description: String::new(),
            grantable_to: Vec::new(),
            stable_key: None
        }
    }

    pub fn with_grantable_to(mut self, resource_type: &ResourceType) -> Self {
        self.grantable_to.push(resource_type.id.clone());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_stable_key(mut self, key: impl Into<String>) -> Self {
        self.stable_key = Some(key.into());
        self
    }
}

pub fn entitlement_id(resource: &ResourceId, slug: &str) -> String {
    format!("{resource}:{slug}")
}

/// An edge asserting that `principal` holds the entitlement `slug` on `resource`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    pub entitlement_id: String,
    pub resource: ResourceId,
    pub slug: String,
    pub principal: ResourceId,
    pub annotations: Annotations
}

impl Grant {
    pub fn new(resource: &Resource, slug: impl Into<String>, principal: &ResourceId) -> Self {
        let slug = slug.into();
        let entitlement_id = entitlement_id(&resource.id, &slug);
        Self {
            id: format!("{entitlement_id}:{principal}"),
            entitlement_id,
            resource: resource.id.clone(),
            slug,
            principal: principal.clone(),
            annotations: Annotations::new()
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn external_id(&self) -> Option<&str> {
        self.annotations.v1_identifier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_type() -> ResourceType {
        ResourceType::new("user", "User", vec![ResourceTrait::User])
    }

    fn group_type() -> ResourceType {
        ResourceType::new("board", "Board", vec![ResourceTrait::Group])
    }

    #[test]
    fn test_resource_requires_identifier() {
        let err = Resource::new_user("alice", &user_type(), "", UserTrait::new()).unwrap_err();
        assert_eq!(
            err,
            CoreError::MissingIdentifier {
                kind: "user".to_string()
            }
        );
    }

    #[test]
    fn test_resource_requires_matching_trait() {
        let err =
            Resource::new_group("alice", &user_type(), "u1", GroupTrait::default()).unwrap_err();
        assert!(matches!(err, CoreError::MissingTrait { .. }));
    }

    #[test]
    fn test_entitlement_and_grant_ids() {
        let board = Resource::new_group("Roadmap", &group_type(), "b1", GroupTrait::default())
            .unwrap();
        let user = ResourceId::new(&user_type(), "u1").unwrap();

        let entitlement = Entitlement::permission(&board, "Voting members");
        assert_eq!(entitlement.id, "board:b1:Voting members");

        let grant = Grant::new(&board, "Voting members", &user)
            .with_annotation(Annotation::v1_identifier("board-grant:b1:u1:Voting members"));
        assert_eq!(grant.entitlement_id, entitlement.id);
        assert_eq!(grant.id, "board:b1:Voting members:user:u1");
        assert_eq!(grant.external_id(), Some("board-grant:b1:u1:Voting members"));
    }

    #[test]
    fn test_expect_type() {
        let board = Resource::new_group("Roadmap", &group_type(), "b1", GroupTrait::default())
            .unwrap();
        assert!(board.expect_type(&group_type()).is_ok());
        assert!(matches!(
            board.expect_type(&user_type()),
            Err(CoreError::UnexpectedResourceType { .. })
        ));
    }
}
