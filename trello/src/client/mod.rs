//! HTTP gateway to the Trello REST API.
//!
//! Every request carries the API key and token as query parameters. Responses
//! are decoded into typed records and annotated with the rate-limit state and
//! the next page token parsed from the `Link` header.

pub mod api;
pub mod models;
pub mod pagination;
pub mod rate_limit;

use chrono::Utc;
use connector_core::Annotations;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::config::TrelloConfig;
use crate::error::{TrelloError, TrelloResult};

pub use api::TrelloApi;
pub use models::{Board, Membership, Organization, PreferenceMode, Preferences, Role, User};
pub use pagination::PageOptions;

/// Used when a 429 response carries no usable reset hint.
const DEFAULT_RETRY_AFTER_SECONDS: u64 = 10;

/// Decoded body plus the metadata the gateway extracted from the response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub next_page_token: Option<String>,
    pub annotations: Annotations
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            next_page_token: None,
            annotations: Annotations::new()
        }
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }
}

pub struct TrelloClient {
    http: Client,
    base_url: Url,
    api_key: String,
    api_token: String,
    organization_ids: Vec<String>,
    page_size: u32
}

impl TrelloClient {
    pub fn new(config: &TrelloConfig) -> TrelloResult<Self> {
        config.validate_config()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(TrelloError::HttpError)?;

        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(TrelloError::ConfigError(format!(
                "base URL {} cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            api_token: config.api_token.clone(),
            organization_ids: config.organizations.clone(),
            page_size: config.page_size
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `<base>/<segments...>?key=..&token=..&<query...>`. Segments are
    /// percent-encoded individually.
    pub fn endpoint_url(&self, segments: &[&str], query: &[(&str, String)]) -> TrelloResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                TrelloError::ConfigError(format!("base URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("key", &self.api_key)
                .append_pair("token", &self.api_token);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Performs one request and decodes its JSON body. Cancelling `cancel`
    /// aborts the in-flight request.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)]
    ) -> TrelloResult<ApiResponse<T>> {
        if cancel.is_cancelled() {
            return Err(TrelloError::Cancelled);
        }

        let url = self.endpoint_url(segments, query)?;
        debug!(method = %method, path = %url.path(), "Making Trello API request");

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(TrelloError::Cancelled),
            result = self.send(method, url) => result
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url
    ) -> TrelloResult<ApiResponse<T>> {
        let response = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| TrelloError::HttpError(e.without_url()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let rate_limit = rate_limit::extract_rate_limit(status, &headers)?;

        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| TrelloError::HttpError(e.without_url()))?;
            let data = serde_json::from_slice::<T>(&body)?;
            let next_page_token = pagination::next_page_token(&headers)?;

            let mut annotations = Annotations::new();
            if let Some(description) = rate_limit {
                annotations.with_rate_limiting(description);
            }

            return Ok(ApiResponse {
                data,
                next_page_token,
                annotations
            });
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_seconds = rate_limit
                    .as_ref()
                    .and_then(|d| rate_limit::retry_after_seconds(d, Utc::now()))
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECONDS);
                Err(TrelloError::RateLimited {
                    retry_after_seconds
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(TrelloError::AuthenticationError(format!(
                    "Trello rejected the API key or token: {}",
                    body.trim()
                )))
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(TrelloError::ApiError {
                    status: status.as_u16(),
                    message
                })
            }
        }
    }
}

pub fn create_trello_client(config: &TrelloConfig) -> TrelloResult<Arc<dyn TrelloApi>> {
    Ok(Arc::new(TrelloClient::new(config)?))
}
