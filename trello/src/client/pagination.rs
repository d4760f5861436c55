use reqwest::header::{HeaderMap, LINK};
use url::Url;

use crate::config::MAX_PAGE_SIZE;
use crate::error::{TrelloError, TrelloResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub page: u32,
    pub per_page: u32
}

impl Default for PageOptions {
    fn default() -> Self {
        Self::new(1, MAX_PAGE_SIZE)
    }
}

impl PageOptions {
    /// Page numbers start at 1; 0 means the first page. Sizes outside
    /// `1..=50` fall back to 50.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: if per_page == 0 || per_page > MAX_PAGE_SIZE {
                MAX_PAGE_SIZE
            } else {
                per_page
            }
        }
    }

    pub fn from_token(token: Option<&str>, per_page: u32) -> Self {
        let page = token.and_then(|t| t.parse().ok()).unwrap_or(1);
        Self::new(page, per_page)
    }

    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("page", self.page.to_string()),
            ("limit", self.per_page.to_string()),
        ]
    }
}

/// Extracts the `page` query parameter of the `rel="next"` link, if any.
pub fn next_page_token(headers: &HeaderMap) -> TrelloResult<Option<String>> {
    let Some(value) = headers.get(LINK) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| TrelloError::InvalidHeader {
        header: LINK.to_string(),
        value: String::from_utf8_lossy(value.as_bytes()).into_owned()
    })?;
    parse_next_page_token(value)
}

pub fn parse_next_page_token(link_header: &str) -> TrelloResult<Option<String>> {
    for link in link_header.split(',') {
        let mut parts = link.split(';');
        let Some(target) = parts.next() else {
            continue;
        };
        let is_next = parts.any(|param| {
            let param = param.trim();
            param
                .strip_prefix("rel=")
                .map(|rel| rel.trim_matches('"'))
                .is_some_and(|rel| rel.split_whitespace().any(|r| r == "next"))
        });
        if !is_next {
            continue;
        }

        let target = target.trim().trim_start_matches('<').trim_end_matches('>');
        let url = Url::parse(target)?;
        let page = url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.into_owned())
            .filter(|page| !page.is_empty());
        return Ok(page);
    }
    Ok(None)
}
