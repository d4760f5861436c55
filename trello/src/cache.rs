//! Per-board memoization of board details and resolved memberships.
//!
//! Each key owns a [`OnceCell`]; the first caller for a key runs the fetch and
//! concurrent callers for the same key await that single fetch. A failed fetch
//! leaves the cell empty, so the next caller tries again.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{Board, TrelloApi, User};
use crate::error::TrelloResult;

pub struct SingleFlightCache<V> {
    entries: DashMap<String, Arc<OnceCell<Arc<V>>>>
}

impl<V> Default for SingleFlightCache<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new()
        }
    }
}

impl<V> SingleFlightCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_init<F, Fut>(&self, key: &str, init: F) -> TrelloResult<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TrelloResult<V>>
    {
        // The shard guard must not be held across the await below.
        let cell = self
            .entries
            .entry(key.to_string())
            .or_default()
            .value()
            .clone();

        cell.get_or_try_init(|| async { init().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Board details and resolved board memberships, keyed by board id.
#[derive(Default)]
pub struct MembershipCache {
    boards: SingleFlightCache<Board>,
    members: SingleFlightCache<Vec<User>>
}

impl MembershipCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn board(
        &self,
        cancel: &CancellationToken,
        api: &dyn TrelloApi,
        board_id: &str
    ) -> TrelloResult<Arc<Board>> {
        self.boards
            .get_or_try_init(board_id, || async {
                debug!(board_id = %board_id, "Fetching board detail");
                Ok(api.get_board(cancel, board_id).await?.data)
            })
            .await
    }

    pub async fn members(
        &self,
        cancel: &CancellationToken,
        api: &dyn TrelloApi,
        board_id: &str
    ) -> TrelloResult<Arc<Vec<User>>> {
        self.members
            .get_or_try_init(board_id, || async {
                debug!(board_id = %board_id, "Resolving board memberships");
                Ok(api.list_memberships_by_board(cancel, board_id).await?.data)
            })
            .await
    }

    pub fn clear(&self) {
        if !self.boards.is_empty() || !self.members.is_empty() {
            debug!(
                boards = self.boards.len(),
                memberships = self.members.len(),
                "Dropping cached board state"
            );
        }
        self.boards.clear();
        self.members.clear();
    }
}
