use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::NotionConfig;

pub mod models;

use self::models::{
    AppendBlockChildrenRequest, AppendBlockChildrenResponse, BlockResponse, CreatePageRequest,
    NotionErrorBody, PageResponse,
};

/// Coarse classification of a failed Notion call, reported in outcomes and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Timeout,
    Network,
    Unauthorized,
    NotFound,
    Rejected,
    InvalidResponse,
}

impl RemoteErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteErrorKind::Timeout => "timeout",
            RemoteErrorKind::Network => "network",
            RemoteErrorKind::Unauthorized => "unauthorized",
            RemoteErrorKind::NotFound => "not_found",
            RemoteErrorKind::Rejected => "rejected",
            RemoteErrorKind::InvalidResponse => "invalid_response",
        }
    }

    /// Whether repeating the same call could succeed. The bridge never
    /// retries; this only feeds diagnostics.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteErrorKind::Timeout | RemoteErrorKind::Network)
    }
}

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("notion request timed out: {0}")]
    Timeout(String),
    #[error("notion request failed: {0}")]
    Network(String),
    #[error("notion rejected the credential: {0}")]
    Unauthorized(String),
    #[error("notion object not found: {0}")]
    NotFound(String),
    #[error("notion rejected request with status {status} ({code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },
    #[error("unexpected notion response: {0}")]
    InvalidResponse(String),
}

impl NotionError {
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            NotionError::Timeout(_) => RemoteErrorKind::Timeout,
            NotionError::Network(_) => RemoteErrorKind::Network,
            NotionError::Unauthorized(_) => RemoteErrorKind::Unauthorized,
            NotionError::NotFound(_) => RemoteErrorKind::NotFound,
            NotionError::Rejected { .. } => RemoteErrorKind::Rejected,
            NotionError::InvalidResponse(_) => RemoteErrorKind::InvalidResponse,
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotionError::Timeout(err.to_string())
        } else if err.is_decode() {
            NotionError::InvalidResponse(err.to_string())
        } else {
            NotionError::Network(err.to_string())
        }
    }

    fn from_status(status: u16, body: &str) -> Self {
        let body: NotionErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = if body.message.is_empty() {
            format!("http status {status}")
        } else {
            body.message
        };

        match status {
            401 | 403 => NotionError::Unauthorized(message),
            404 => NotionError::NotFound(message),
            _ => NotionError::Rejected {
                status,
                code: body.code,
                message,
            },
        }
    }
}

/// The three remote operations the bridge needs from the document store.
///
/// The secret is passed per call because every chat brings its own
/// integration token.
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// Creates a page inside `collection_id` titled `title` and returns its id.
    async fn create_record(
        &self,
        secret: &SecretString,
        collection_id: &str,
        title: &str,
    ) -> Result<String, NotionError>;

    /// Reports whether `record_id` still exists and is not archived.
    async fn retrieve_record(
        &self,
        secret: &SecretString,
        record_id: &str,
    ) -> Result<bool, NotionError>;

    /// Appends `text` as a paragraph block under `record_id`.
    async fn append_child(
        &self,
        secret: &SecretString,
        record_id: &str,
        text: &str,
    ) -> Result<(), NotionError>;
}

#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    api_url: String,
    api_version: String,
    title_property: String,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self> {
        info!(
            "initializing notion client for {} (version {})",
            config.api_url, config.api_version
        );

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            title_property: config.title_property.clone(),
        })
    }

    fn request(&self, method: Method, path: &str, secret: &SecretString) -> RequestBuilder {
        self.http
            .request(method, format!("{}/v1/{}", self.api_url, path))
            .bearer_auth(secret.expose_secret())
            .header("Notion-Version", &self.api_version)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, NotionError> {
        let response = request.send().await.map_err(NotionError::from_transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotionError::from_status(status.as_u16(), &body));
        }

        response
            .json::<T>()
            .await
            .map_err(NotionError::from_transport)
    }
}

#[async_trait]
impl NotionApi for NotionClient {
    async fn create_record(
        &self,
        secret: &SecretString,
        collection_id: &str,
        title: &str,
    ) -> Result<String, NotionError> {
        let body = CreatePageRequest::in_database(collection_id, &self.title_property, title);
        let page: PageResponse = self
            .send_json(self.request(Method::POST, "pages", secret).json(&body))
            .await?;

        if page.id.is_empty() {
            return Err(NotionError::InvalidResponse(
                "created page has no id".to_string(),
            ));
        }
        debug!(
            "notion page created page_id={} database_id={} url={:?}",
            page.id, collection_id, page.url
        );
        Ok(page.id)
    }

    async fn retrieve_record(
        &self,
        secret: &SecretString,
        record_id: &str,
    ) -> Result<bool, NotionError> {
        let request = self.request(Method::GET, &format!("blocks/{record_id}"), secret);
        match self.send_json::<BlockResponse>(request).await {
            Ok(block) => {
                debug!(
                    "notion block fetched block_id={} archived={} in_trash={}",
                    block.id, block.archived, block.in_trash
                );
                Ok(block.is_live())
            }
            Err(NotionError::NotFound(message)) => {
                debug!("notion block missing block_id={} reason={}", record_id, message);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn append_child(
        &self,
        secret: &SecretString,
        record_id: &str,
        text: &str,
    ) -> Result<(), NotionError> {
        let body = AppendBlockChildrenRequest::paragraph(text);
        let response: AppendBlockChildrenResponse = self
            .send_json(
                self.request(Method::PATCH, &format!("blocks/{record_id}/children"), secret)
                    .json(&body),
            )
            .await?;

        debug!(
            "notion children appended block_id={} results={}",
            record_id,
            response.results.len()
        );
        Ok(())
    }
}
