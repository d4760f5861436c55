use async_trait::async_trait;
use connector_core::Annotations;
use reqwest::Method;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::models::{Board, Membership, Organization, User};
use super::pagination::PageOptions;
use super::{ApiResponse, TrelloClient};
use crate::config::MAX_PAGE_SIZE;
use crate::error::{TrelloError, TrelloResult};

/// Endpoints of the Trello API used by the connector.
///
/// Implementors provide the single-request endpoints; the aggregate fetchers
/// (`list_*`) are built on top of them and fail on the first error without
/// returning partial results.
#[async_trait]
pub trait TrelloApi: Send + Sync {
    /// Organizations that bound the sync scope, in configuration order.
    fn organization_ids(&self) -> &[String];

    fn page_size(&self) -> u32 {
        MAX_PAGE_SIZE
    }

    async fn get_organization(
        &self,
        cancel: &CancellationToken,
        organization_id: &str
    ) -> TrelloResult<ApiResponse<Organization>>;

    async fn list_organization_boards(
        &self,
        cancel: &CancellationToken,
        organization_id: &str,
        page: PageOptions
    ) -> TrelloResult<ApiResponse<Vec<Board>>>;

    async fn list_organization_members(
        &self,
        cancel: &CancellationToken,
        organization_id: &str
    ) -> TrelloResult<ApiResponse<Vec<User>>>;

    async fn list_organization_memberships(
        &self,
        cancel: &CancellationToken,
        organization_id: &str
    ) -> TrelloResult<ApiResponse<Vec<Membership>>>;

    async fn get_board(
        &self,
        cancel: &CancellationToken,
        board_id: &str
    ) -> TrelloResult<ApiResponse<Board>>;

    async fn list_board_memberships(
        &self,
        cancel: &CancellationToken,
        board_id: &str
    ) -> TrelloResult<ApiResponse<Vec<Membership>>>;

    async fn get_member(
        &self,
        cancel: &CancellationToken,
        member_id: &str
    ) -> TrelloResult<ApiResponse<User>>;

    /// One organization per configured identifier, in order. The aggregate
    /// annotations are those of the last successful call.
    async fn list_organizations(
        &self,
        cancel: &CancellationToken
    ) -> TrelloResult<ApiResponse<Vec<Organization>>> {
        let mut organizations = Vec::with_capacity(self.organization_ids().len());
        let mut annotations = Annotations::new();

        for organization_id in self.organization_ids() {
            ensure_active(cancel)?;
            let response = self.get_organization(cancel, organization_id).await?;
            organizations.push(response.data);
            annotations.merge(response.annotations);
        }

        Ok(ApiResponse::new(organizations).with_annotations(annotations))
    }

    /// Boards of every configured organization, organization by organization,
    /// following `Link` pagination to the end.
    async fn list_boards(
        &self,
        cancel: &CancellationToken
    ) -> TrelloResult<ApiResponse<Vec<Board>>> {
        let mut boards = Vec::new();
        let mut annotations = Annotations::new();

        for organization_id in self.organization_ids() {
            let mut page = PageOptions::new(1, self.page_size());
            loop {
                ensure_active(cancel)?;
                let response = self
                    .list_organization_boards(cancel, organization_id, page)
                    .await?;
                debug!(
                    organization_id = %organization_id,
                    page = page.page,
                    count = response.data.len(),
                    "Fetched boards page"
                );
                boards.extend(response.data);
                annotations.merge(response.annotations);

                let Some(token) = response.next_page_token else {
                    break;
                };
                let next = PageOptions::from_token(Some(&token), self.page_size());
                if next.page <= page.page {
                    warn!(
                        organization_id = %organization_id,
                        token = %token,
                        "Next page does not advance, stopping board pagination"
                    );
                    break;
                }
                page = next;
            }
        }

        Ok(ApiResponse::new(boards).with_annotations(annotations))
    }

    /// Members of every configured organization. Trello does not paginate
    /// this endpoint, so no next page token is ever produced. A member of
    /// several organizations is returned once.
    async fn list_users(&self, cancel: &CancellationToken) -> TrelloResult<ApiResponse<Vec<User>>> {
        let mut users = Vec::new();
        let mut seen = HashSet::new();
        let mut annotations = Annotations::new();

        for organization_id in self.organization_ids() {
            ensure_active(cancel)?;
            let response = self
                .list_organization_members(cancel, organization_id)
                .await?;
            users.extend(
                response
                    .data
                    .into_iter()
                    .filter(|user| seen.insert(user.id.clone()))
            );
            annotations.merge(response.annotations);
        }

        Ok(ApiResponse::new(users).with_annotations(annotations))
    }

    async fn list_memberships_by_org(
        &self,
        cancel: &CancellationToken,
        organization_id: &str
    ) -> TrelloResult<ApiResponse<Vec<User>>> {
        let response = self
            .list_organization_memberships(cancel, organization_id)
            .await?;
        let users = self.resolve_memberships(cancel, &response.data).await?;
        Ok(ApiResponse::new(users).with_annotations(response.annotations))
    }

    async fn list_memberships_by_board(
        &self,
        cancel: &CancellationToken,
        board_id: &str
    ) -> TrelloResult<ApiResponse<Vec<User>>> {
        let response = self.list_board_memberships(cancel, board_id).await?;
        let users = self.resolve_memberships(cancel, &response.data).await?;
        Ok(ApiResponse::new(users).with_annotations(response.annotations))
    }

    /// Fetches member detail for every membership and stamps the role onto
    /// it. Any failed detail fetch aborts the whole resolution.
    async fn resolve_memberships(
        &self,
        cancel: &CancellationToken,
        memberships: &[Membership]
    ) -> TrelloResult<Vec<User>> {
        let mut users = Vec::with_capacity(memberships.len());
        for membership in memberships {
            ensure_active(cancel)?;
            let detail = self.get_member(cancel, &membership.member_id).await?;
            users.push(detail.data.joined_with(membership));
        }
        Ok(users)
    }
}

fn ensure_active(cancel: &CancellationToken) -> TrelloResult<()> {
    if cancel.is_cancelled() {
        Err(TrelloError::Cancelled)
    } else {
        Ok(())
    }
}

fn not_found_as(kind: &'static str, id: &str) -> impl FnOnce(TrelloError) -> TrelloError {
    let id = id.to_string();
    move |err| match err {
        TrelloError::ApiError { status: 404, .. } => TrelloError::not_found(kind, &id),
        other => other
    }
}

#[async_trait]
impl TrelloApi for TrelloClient {
    fn organization_ids(&self) -> &[String] {
        &self.organization_ids
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn get_organization(
        &self,
        cancel: &CancellationToken,
        organization_id: &str
    ) -> TrelloResult<ApiResponse<Organization>> {
        let ApiResponse {
            data,
            next_page_token,
            annotations
        } = self
            .fetch::<Option<Organization>>(
                cancel,
                Method::GET,
                &["organizations", organization_id],
                &[]
            )
            .await
            .map_err(not_found_as("organization", organization_id))?;

        // A `null` body is treated the same as a 404.
        let organization =
            data.ok_or_else(|| TrelloError::not_found("organization", organization_id))?;

        Ok(ApiResponse {
            data: organization,
            next_page_token,
            annotations
        })
    }

    async fn list_organization_boards(
        &self,
        cancel: &CancellationToken,
        organization_id: &str,
        page: PageOptions
    ) -> TrelloResult<ApiResponse<Vec<Board>>> {
        self.fetch(
            cancel,
            Method::GET,
            &["organizations", organization_id, "boards"],
            &page.query()
        )
        .await
        .map_err(not_found_as("organization", organization_id))
    }

    async fn list_organization_members(
        &self,
        cancel: &CancellationToken,
        organization_id: &str
    ) -> TrelloResult<ApiResponse<Vec<User>>> {
        self.fetch(
            cancel,
            Method::GET,
            &["organizations", organization_id, "members"],
            &[]
        )
        .await
        .map_err(not_found_as("organization", organization_id))
    }

    async fn list_organization_memberships(
        &self,
        cancel: &CancellationToken,
        organization_id: &str
    ) -> TrelloResult<ApiResponse<Vec<Membership>>> {
        self.fetch(
            cancel,
            Method::GET,
            &["organizations", organization_id, "memberships"],
            &[]
        )
        .await
        .map_err(not_found_as("organization", organization_id))
    }

    async fn get_board(
        &self,
        cancel: &CancellationToken,
        board_id: &str
    ) -> TrelloResult<ApiResponse<Board>> {
        self.fetch(cancel, Method::GET, &["boards", board_id], &[])
            .await
            .map_err(not_found_as("board", board_id))
    }

    async fn list_board_memberships(
        &self,
        cancel: &CancellationToken,
        board_id: &str
    ) -> TrelloResult<ApiResponse<Vec<Membership>>> {
        self.fetch(cancel, Method::GET, &["boards", board_id, "memberships"], &[])
            .await
            .map_err(not_found_as("board", board_id))
    }

    async fn get_member(
        &self,
        cancel: &CancellationToken,
        member_id: &str
    ) -> TrelloResult<ApiResponse<User>> {
        self.fetch(cancel, Method::GET, &["members", member_id], &[])
            .await
            .map_err(not_found_as("member", member_id))
    }
}
