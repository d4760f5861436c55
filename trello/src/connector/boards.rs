//! Boards as group resources, with entitlements derived from the board's
//! preferences and grants derived from its memberships.
//!
//! Entitlement slugs are the human-readable labels (`"Voting members"`,
//! `"self join enabled"`) and are reused verbatim in grant identifiers, so a
//! change of label format changes grant identity. The [`BoardPermission`]
//! key is attached as the entitlement's stable key.

use async_trait::async_trait;
use connector_core::{
    Annotation, Entitlement, GroupTrait, Grant, Page, PageToken, Profile, Resource, ResourceId,
    ResourceSyncer, ResourceType
};
use serde_json::json;
use std::sync::Arc;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::users::user_resource;
use super::{GrantKind, grant_identifier, resource_types};
use crate::cache::MembershipCache;
use crate::client::{Board, PreferenceMode, Preferences, Role, TrelloApi, User};
use crate::error::{TrelloError, TrelloResult};

/// Board capabilities exposed as entitlements, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum BoardPermission {
    SelfJoin,
    Voting,
    Comments,
    Invitations
}

impl BoardPermission {
    pub fn key(self) -> &'static str {
        self.into()
    }

    fn mode(self, preferences: &Preferences) -> Option<&PreferenceMode> {
        match self {
            Self::SelfJoin => None,
            Self::Voting => Some(&preferences.voting),
            Self::Comments => Some(&preferences.comments),
            Self::Invitations => Some(&preferences.invitations)
        }
    }

    pub fn label(self, preferences: &Preferences) -> String {
        match (self, self.mode(preferences)) {
            (_, None) if preferences.self_join => "self join enabled".to_string(),
            (_, None) => "self join disabled".to_string(),
            (Self::Voting, Some(mode)) => format!("Voting {mode}"),
            (Self::Comments, Some(mode)) => format!("Comments {mode}"),
            (_, Some(mode)) => format!("Invitations {mode}")
        }
    }

    fn description(self, label: &str, board_name: &str) -> String {
        match self {
            Self::SelfJoin => format!("Is {label} for board {board_name} in Trello"),
            _ => format!("{label} for board {board_name} in Trello")
        }
    }

    /// Whether a member with `role` holds this permission on the board.
    pub fn is_granted(self, role: &Role, preferences: &Preferences) -> bool {
        match self.mode(preferences) {
            None => preferences.self_join,
            Some(mode) => evaluate_membership(role, mode)
        }
    }
}

/// Admins hold a feature restricted to admins; everyone holds a feature open
/// to members. Unknown roles and modes never match.
pub fn evaluate_membership(role: &Role, mode: &PreferenceMode) -> bool {
    (*role == Role::Admin && *mode == PreferenceMode::Admins) || *mode == PreferenceMode::Members
}

pub fn board_resource(board: &Board) -> TrelloResult<Resource> {
    let prefs = &board.preferences;
    let mut profile = Profile::new();
    profile.insert("board_id".to_string(), json!(board.id));
    profile.insert("display_name".to_string(), json!(board.name));
    profile.insert("description".to_string(), json!(board.description));
    profile.insert("permission_level".to_string(), json!(prefs.permission_level));
    profile.insert("hide_votes".to_string(), json!(prefs.hide_votes));
    profile.insert("voting".to_string(), json!(prefs.voting));
    profile.insert("comments".to_string(), json!(prefs.comments));
    profile.insert("invitations".to_string(), json!(prefs.invitations));
    profile.insert("self_join".to_string(), json!(prefs.self_join));

    let parent = board
        .id_organization
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(|id| ResourceId::new(&resource_types::ORGANIZATION, id))
        .transpose()?;

    let resource = Resource::new_group(
        &board.name,
        &resource_types::BOARD,
        &board.id,
        GroupTrait::with_profile(profile)
    )?
    .with_parent(parent);
    Ok(resource)
}

/// The four board entitlements, labelled from the board's current preferences.
pub fn board_entitlements(resource: &Resource, preferences: &Preferences) -> Vec<Entitlement> {
    BoardPermission::iter()
        .map(|permission| {
            let label = permission.label(preferences);
            Entitlement::permission(resource, &label)
                .with_grantable_to(&resource_types::USER)
                .with_description(permission.description(&label, &resource.display_name))
                .with_display_name(format!("{} Board {}", resource.display_name, label))
                .with_stable_key(permission.key())
        })
        .collect()
}

/// Grants for every resolved member, member by member, in permission order.
pub fn synthesize_board_grants(
    resource: &Resource,
    preferences: &Preferences,
    members: &[User]
) -> TrelloResult<Vec<Grant>> {
    let mut grants = Vec::new();
    for member in members {
        let principal = user_resource(member, Some(&resource.id))?;
        let role = member
            .member_type
            .clone()
            .unwrap_or_else(|| Role::Unknown(String::new()));

        for permission in BoardPermission::iter() {
            if !permission.is_granted(&role, preferences) {
                continue;
            }
            let label = permission.label(preferences);
            let identifier = grant_identifier(
                GrantKind::Board,
                &resource.id.resource,
                member.grant_member_id(),
                &label
            );
            grants.push(
                Grant::new(resource, label, &principal.id)
                    .with_annotation(Annotation::v1_identifier(identifier))
            );
        }
    }
    Ok(grants)
}

pub struct BoardSyncer {
    client: Arc<dyn TrelloApi>,
    cache: MembershipCache
}

impl BoardSyncer {
    pub fn new(client: Arc<dyn TrelloApi>) -> Self {
        Self {
            client,
            cache: MembershipCache::new()
        }
    }
}

#[async_trait]
impl ResourceSyncer for BoardSyncer {
    type Error = TrelloError;

    fn resource_type(&self) -> &ResourceType {
        &resource_types::BOARD
    }

    /// Boards of every configured organization, parented to their
    /// organization. Starts a new pass, so cached board state is dropped.
    async fn list(
        &self,
        cancel: &CancellationToken,
        _parent: Option<&ResourceId>,
        _token: &PageToken
    ) -> TrelloResult<Page<Resource>> {
        self.cache.clear();

        let response = self.client.list_boards(cancel).await?;
        let resources = response
            .data
            .iter()
            .map(board_resource)
            .collect::<TrelloResult<Vec<_>>>()?;

        info!(count = resources.len(), "Listed Trello boards");
        Ok(Page::new(resources).with_annotations(response.annotations))
    }

    async fn entitlements(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        _token: &PageToken
    ) -> TrelloResult<Page<Entitlement>> {
        resource.expect_type(&resource_types::BOARD)?;
        let board = self
            .cache
            .board(cancel, self.client.as_ref(), &resource.id.resource)
            .await?;

        Ok(Page::new(board_entitlements(resource, &board.preferences)))
    }

    async fn grants(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        _token: &PageToken
    ) -> TrelloResult<Page<Grant>> {
        resource.expect_type(&resource_types::BOARD)?;
        let board_id = &resource.id.resource;

        let board = self.cache.board(cancel, self.client.as_ref(), board_id).await?;
        let members = self
            .cache
            .members(cancel, self.client.as_ref(), board_id)
            .await?;

        let grants = synthesize_board_grants(resource, &board.preferences, &members)?;
        debug!(
            board_id = %board_id,
            members = members.len(),
            grants = grants.len(),
            "Synthesized board grants"
        );
        Ok(Page::new(grants))
    }
}
