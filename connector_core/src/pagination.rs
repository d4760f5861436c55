use serde::{Deserialize, Serialize};

use crate::annotations::Annotations;

/// Cursor handed back by the platform on the next call of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageToken {
    pub token: Option<String>
}

impl PageToken {
    pub fn first() -> Self {
        Self::default()
    }

    pub fn resume(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into())
        }
    }

    pub fn is_first(&self) -> bool {
        self.token.as_deref().is_none_or(str::is_empty)
    }
}

/// One page of a listing with the token for the next call, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
    pub annotations: Annotations
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
            annotations: Annotations::new()
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_next_page_token(mut self, token: Option<String>) -> Self {
        self.next_page_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }
}
