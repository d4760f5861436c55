//! Records returned by the Trello REST API.

use serde::{Deserialize, Deserializer, Serialize};

/// Trello sends `null` for many string fields it otherwise documents as strings.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Role of a member on a board or organization.
///
/// Only `admin`, `normal` and `observer` take part in grant decisions. Any
/// other upstream value is kept verbatim and never matches a privileged rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Normal,
    Observer,
    Unknown(String)
}

impl Role {
    pub const RECOGNIZED: [Role; 3] = [Role::Admin, Role::Normal, Role::Observer];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Normal => "normal",
            Self::Observer => "observer",
            Self::Unknown(raw) => raw
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "admin" => Self::Admin,
            "normal" => Self::Normal,
            "observer" => Self::Observer,
            _ => Self::Unknown(raw)
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Unknown(raw) => raw,
            known => known.as_str().to_string()
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may use a board feature (voting, comments, invitations).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PreferenceMode {
    #[default]
    Disabled,
    Members,
    Admins,
    Observers,
    Org,
    Public,
    Unknown(String)
}

impl PreferenceMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Disabled => "disabled",
            Self::Members => "members",
            Self::Admins => "admins",
            Self::Observers => "observers",
            Self::Org => "org",
            Self::Public => "public",
            Self::Unknown(raw) => raw
        }
    }
}

impl From<String> for PreferenceMode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "disabled" => Self::Disabled,
            "members" => Self::Members,
            "admins" => Self::Admins,
            "observers" => Self::Observers,
            "org" => Self::Org,
            "public" => Self::Public,
            _ => Self::Unknown(raw)
        }
    }
}

impl From<&str> for PreferenceMode {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<PreferenceMode> for String {
    fn from(mode: PreferenceMode) -> Self {
        match mode {
            PreferenceMode::Unknown(raw) => raw,
            known => known.as_str().to_string()
        }
    }
}

impl std::fmt::Display for PreferenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(rename = "desc", deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    pub website: Option<String>,
    pub team_type: Option<String>,
    pub logo_hash: Option<String>,
    pub logo_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub offering: String,
    #[serde(deserialize_with = "null_as_default")]
    pub products: Vec<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub power_ups: Vec<i64>
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    #[serde(deserialize_with = "null_as_default")]
    pub permission_level: String,
    pub hide_votes: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub voting: PreferenceMode,
    #[serde(deserialize_with = "null_as_default")]
    pub comments: PreferenceMode,
    #[serde(deserialize_with = "null_as_default")]
    pub invitations: PreferenceMode,
    pub self_join: bool,
    pub card_covers: bool,
    pub show_complete_status: bool,
    pub card_counts: bool,
    pub is_template: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub card_aging: String,
    pub calendar_feed_enabled: bool,
    pub can_be_public: bool,
    pub can_be_enterprise: bool,
    pub can_be_org: bool,
    pub can_be_private: bool,
    pub can_invite: bool
}

/// A `(member, role)` pair. Carries no profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "idMember")]
    pub member_id: String,
    #[serde(rename = "memberType")]
    pub role: Role,
    #[serde(default)]
    pub unconfirmed: bool,
    #[serde(default)]
    pub deactivated: bool
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Board {
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "desc", deserialize_with = "null_as_default")]
    pub description: String,
    pub closed: bool,
    pub id_organization: Option<String>,
    pub pinned: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(rename = "prefs", deserialize_with = "null_as_default")]
    pub preferences: Preferences,
    #[serde(deserialize_with = "null_as_default")]
    pub memberships: Vec<Membership>
}

/// A Trello member. `member_type` is only set after joining with a
/// [`Membership`] for a specific board or organization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    #[serde(rename = "idMember", deserialize_with = "null_as_default")]
    pub member_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    pub member_type: Option<Role>
}

impl User {
    /// Completes a member-detail record with the role from `membership`.
    pub fn joined_with(mut self, membership: &Membership) -> Self {
        self.member_id = membership.member_id.clone();
        self.member_type = Some(membership.role.clone());
        self
    }

    /// Identifier used in grant identifiers: the membership's member id when
    /// joined, the user id otherwise.
    pub fn grant_member_id(&self) -> &str {
        if self.member_id.is_empty() {
            &self.id
        } else {
            &self.member_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_falls_back_to_unknown() {
        let role: Role = serde_json::from_str("\"owner\"").unwrap();
        assert_eq!(role, Role::Unknown("owner".to_string()));
        assert!(!role.is_recognized());
        assert_eq!(role.as_str(), "owner");

        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_preference_mode_keeps_raw_value() {
        let mode = PreferenceMode::from("enterprise");
        assert_eq!(mode.as_str(), "enterprise");
        assert_eq!(PreferenceMode::from("members"), PreferenceMode::Members);
        assert_eq!(String::from(PreferenceMode::Admins), "admins");
    }

    #[test]
    fn test_organization_tolerates_nulls() {
        let org: Organization = serde_json::from_str(
            r#"{
                "id": "1ed53893",
                "name": "organizationTest",
                "displayName": "Trello Workspace Test",
                "desc": "",
                "descData": { "emoji": {} },
                "url": "https://trello.com/w/organizationTest",
                "website": null,
                "teamType": null,
                "logoHash": null,
                "logoUrl": null,
                "offering": "trello.business_class",
                "products": [110],
                "powerUps": [110]
            }"#
        )
        .unwrap();

        assert_eq!(org.display_name, "Trello Workspace Test");
        assert_eq!(org.website, None);
        assert_eq!(org.products, vec![110]);
    }

    #[test]
    fn test_board_with_preferences_and_memberships() {
        let board: Board = serde_json::from_str(
            r#"{
                "id": "b1",
                "name": "Roadmap",
                "desc": null,
                "closed": false,
                "idOrganization": "org1",
                "prefs": {
                    "permissionLevel": "org",
                    "voting": "disabled",
                    "comments": "members",
                    "invitations": "admins",
                    "selfJoin": true
                },
                "memberships": [
                    { "id": "m1", "idMember": "u1", "memberType": "admin" }
                ]
            }"#
        )
        .unwrap();

        assert_eq!(board.description, "");
        assert_eq!(board.id_organization.as_deref(), Some("org1"));
        assert!(board.preferences.self_join);
        assert_eq!(board.preferences.invitations, PreferenceMode::Admins);
        assert_eq!(board.memberships[0].role, Role::Admin);
    }

    #[test]
    fn test_user_join_stamps_role() {
        let user = User {
            id: "u1".to_string(),
            full_name: "Ada".to_string(),
            username: "ada".to_string(),
            ..Default::default()
        };
        assert_eq!(user.grant_member_id(), "u1");

        let membership = Membership {
            id: "m1".to_string(),
            member_id: "u1".to_string(),
            role: Role::Observer,
            unconfirmed: false,
            deactivated: false
        };
        let joined = user.joined_with(&membership);
        assert_eq!(joined.member_type, Some(Role::Observer));
        assert_eq!(joined.grant_member_id(), "u1");
    }
}
