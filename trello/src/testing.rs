//! In-memory `TrelloApi` used by the unit tests of the cache and syncers.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

use crate::client::{
    ApiResponse, Board, Membership, Organization, PageOptions, PreferenceMode, Preferences, Role,
    TrelloApi, User
};
use crate::error::{TrelloError, TrelloResult};

#[derive(Default)]
pub struct FakeTrello {
    pub organization_ids: Vec<String>,
    pub organizations: HashMap<String, Organization>,
    pub boards: Vec<Board>,
    pub users: HashMap<String, User>,
    pub org_memberships: HashMap<String, Vec<Membership>>,
    pub failing_members: HashSet<String>,
    pub page_size: u32,
    board_calls: AtomicUsize,
    board_membership_calls: AtomicUsize,
    member_calls: AtomicUsize
}

pub fn membership(member_id: &str, role: &str) -> Membership {
    Membership {
        id: format!("m-{member_id}"),
        member_id: member_id.to_string(),
        role: Role::from(role),
        unconfirmed: false,
        deactivated: false
    }
}

pub fn user(id: &str, username: &str, full_name: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        full_name: full_name.to_string(),
        ..Default::default()
    }
}

pub fn organization(id: &str, display_name: &str) -> Organization {
    Organization {
        id: id.to_string(),
        name: id.to_string(),
        display_name: display_name.to_string(),
        ..Default::default()
    }
}

impl FakeTrello {
    /// One organization `org1` holding board `b1` with self-join enabled,
    /// voting disabled, comments for members and invitations for admins.
    /// `u1` is a board admin, `u2` a normal member; `u3` sits in the
    /// organization with a role the connector does not know.
    pub fn scenario() -> Self {
        let board = Board {
            id: "b1".to_string(),
            name: "Roadmap".to_string(),
            id_organization: Some("org1".to_string()),
            preferences: Preferences {
                permission_level: "org".to_string(),
                self_join: true,
                voting: PreferenceMode::Disabled,
                comments: PreferenceMode::Members,
                invitations: PreferenceMode::Admins,
                ..Default::default()
            },
            memberships: vec![membership("u1", "admin"), membership("u2", "normal")],
            ..Default::default()
        };

        Self {
            organization_ids: vec!["org1".to_string()],
            organizations: HashMap::from([(
                "org1".to_string(),
                organization("org1", "Acme")
            )]),
            boards: vec![board],
            users: HashMap::from([
                ("u1".to_string(), user("u1", "alice", "Alice Liddell")),
                ("u2".to_string(), user("u2", "bob", "Bob Dylan")),
                ("u3".to_string(), user("u3", "carol", "Carol Danvers")),
            ]),
            org_memberships: HashMap::from([(
                "org1".to_string(),
                vec![
                    membership("u1", "admin"),
                    membership("u2", "normal"),
                    membership("u3", "owner"),
                ]
            )]),
            page_size: 50,
            ..Default::default()
        }
    }

    pub fn board_calls(&self) -> usize {
        self.board_calls.load(Ordering::SeqCst)
    }

    pub fn board_membership_calls(&self) -> usize {
        self.board_membership_calls.load(Ordering::SeqCst)
    }

    pub fn member_calls(&self) -> usize {
        self.member_calls.load(Ordering::SeqCst)
    }

    fn find_board(&self, board_id: &str) -> TrelloResult<&Board> {
        self.boards
            .iter()
            .find(|board| board.id == board_id)
            .ok_or_else(|| TrelloError::not_found("board", board_id))
    }
}

#[async_trait]
impl TrelloApi for FakeTrello {
    fn organization_ids(&self) -> &[String] {
        &self.organization_ids
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn get_organization(
        &self,
        _cancel: &CancellationToken,
        organization_id: &str
    ) -> TrelloResult<ApiResponse<Organization>> {
        self.organizations
            .get(organization_id)
            .cloned()
            .map(ApiResponse::new)
            .ok_or_else(|| TrelloError::not_found("organization", organization_id))
    }

    async fn list_organization_boards(
        &self,
        _cancel: &CancellationToken,
        organization_id: &str,
        page: PageOptions
    ) -> TrelloResult<ApiResponse<Vec<Board>>> {
        let boards: Vec<Board> = self
            .boards
            .iter()
            .filter(|board| board.id_organization.as_deref() == Some(organization_id))
            .cloned()
            .collect();

        let per_page = page.per_page as usize;
        let start = (page.page as usize - 1) * per_page;
        let data: Vec<Board> = boards.iter().skip(start).take(per_page).cloned().collect();
        let mut response = ApiResponse::new(data);
        if start + per_page < boards.len() {
            response.next_page_token = Some((page.page + 1).to_string());
        }
        Ok(response)
    }

    async fn list_organization_members(
        &self,
        _cancel: &CancellationToken,
        organization_id: &str
    ) -> TrelloResult<ApiResponse<Vec<User>>> {
        let memberships = self
            .org_memberships
            .get(organization_id)
            .ok_or_else(|| TrelloError::not_found("organization", organization_id))?;
        let users = memberships
            .iter()
            .filter_map(|m| self.users.get(&m.member_id).cloned())
            .collect();
        Ok(ApiResponse::new(users))
    }

    async fn list_organization_memberships(
        &self,
        _cancel: &CancellationToken,
        organization_id: &str
    ) -> TrelloResult<ApiResponse<Vec<Membership>>> {
        self.org_memberships
            .get(organization_id)
            .cloned()
            .map(ApiResponse::new)
            .ok_or_else(|| TrelloError::not_found("organization", organization_id))
    }

    async fn get_board(
        &self,
        _cancel: &CancellationToken,
        board_id: &str
    ) -> TrelloResult<ApiResponse<Board>> {
        self.board_calls.fetch_add(1, Ordering::SeqCst);
        self.find_board(board_id).cloned().map(ApiResponse::new)
    }

    async fn list_board_memberships(
        &self,
        _cancel: &CancellationToken,
        board_id: &str
    ) -> TrelloResult<ApiResponse<Vec<Membership>>> {
        self.board_membership_calls.fetch_add(1, Ordering::SeqCst);
        let board = self.find_board(board_id)?;
        Ok(ApiResponse::new(board.memberships.clone()))
    }

    async fn get_member(
        &self,
        _cancel: &CancellationToken,
        member_id: &str
    ) -> TrelloResult<ApiResponse<User>> {
        self.member_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_members.contains(member_id) {
            return Err(TrelloError::ApiError {
                status: 500,
                message: "member lookup failed".to_string()
            });
        }
        self.users
            .get(member_id)
            .cloned()
            .map(ApiResponse::new)
            .ok_or_else(|| TrelloError::not_found("member", member_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_boards_follows_pages_per_organization() {
        let mut fake = FakeTrello::scenario();
        fake.page_size = 2;
        fake.organization_ids.push("org2".to_string());
        for (id, org) in [("b2", "org1"), ("b3", "org1"), ("c1", "org2"), ("c2", "org2")] {
            fake.boards.push(Board {
                id: id.to_string(),
                id_organization: Some(org.to_string()),
                ..Default::default()
            });
        }

        let boards = fake.list_boards(&CancellationToken::new()).await.unwrap();
        let ids: Vec<&str> = boards.data.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["b1", "b2", "b3", "c1", "c2"]);
        assert_eq!(boards.next_page_token, None);
    }

    #[tokio::test]
    async fn test_list_organizations_in_configured_order() {
        let mut fake = FakeTrello::scenario();
        fake.organization_ids = vec!["org2".to_string(), "org1".to_string()];
        fake.organizations
            .insert("org2".to_string(), organization("org2", "Globex"));

        let orgs = fake
            .list_organizations(&CancellationToken::new())
            .await
            .unwrap();
        let ids: Vec<&str> = orgs.data.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["org2", "org1"]);
    }

    #[tokio::test]
    async fn test_list_organizations_fails_fast() {
        let mut fake = FakeTrello::scenario();
        fake.organization_ids = vec!["missing".to_string(), "org1".to_string()];

        let err = fake
            .list_organizations(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TrelloError::NotFound { ref id, .. } if id == "missing"));
    }

    #[tokio::test]
    async fn test_list_users_deduplicates_across_organizations() {
        let mut fake = FakeTrello::scenario();
        fake.organization_ids.push("org2".to_string());
        fake.org_memberships.insert(
            "org2".to_string(),
            vec![membership("u2", "admin"), membership("u1", "normal")]
        );

        let users = fake.list_users(&CancellationToken::new()).await.unwrap();
        let ids: Vec<&str> = users.data.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["u1", "u2", "u3"]);
        assert_eq!(users.next_page_token, None);
    }

    #[tokio::test]
    async fn test_resolve_memberships_stamps_roles() {
        let fake = FakeTrello::scenario();
        let users = fake
            .list_memberships_by_board(&CancellationToken::new(), "b1")
            .await
            .unwrap();

        assert_eq!(users.data.len(), 2);
        assert_eq!(users.data[0].member_type, Some(Role::Admin));
        assert_eq!(users.data[0].member_id, "u1");
        assert_eq!(users.data[1].member_type, Some(Role::Normal));
        assert_eq!(fake.member_calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_member_detail_aborts_resolution() {
        let mut fake = FakeTrello::scenario();
        fake.failing_members.insert("u2".to_string());

        let err = fake
            .list_memberships_by_org(&CancellationToken::new(), "org1")
            .await
            .unwrap_err();
        assert!(matches!(err, TrelloError::ApiError { status: 500, .. }));
        assert_eq!(fake.member_calls(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_aggregate_stops_before_fetching() {
        let fake = FakeTrello::scenario();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fake
            .list_memberships_by_board(&cancel, "b1")
            .await
            .unwrap_err();
        assert!(matches!(err, TrelloError::Cancelled));
        assert_eq!(fake.member_calls(), 0);
    }
}
