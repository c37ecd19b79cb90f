//! HTTP client for a Prismic-style content API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{orderings_param, ContentStore, Predicate, QueryOptions, QueryResponse};
use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// API root document, only the parts the client needs
#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

/// How long a looked-up master ref is reused
const MASTER_REF_TTL: Duration = Duration::from_secs(5);

/// Content store client over HTTP
pub struct PrismicClient {
    client: Client,
    endpoint: String,
    access_token: Option<String>,
    master: RwLock<Option<(String, Instant)>>,
}

impl PrismicClient {
    /// Create a client for the configured endpoint
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            master: RwLock::new(None),
        })
    }

    /// Current published revision
    ///
    /// The ref is looked up at most once per [`MASTER_REF_TTL`]; failed
    /// lookups are not remembered.
    pub async fn master_ref(&self) -> Result<String> {
        if let Some((reference, fetched_at)) = self.master.read().await.as_ref() {
            if fetched_at.elapsed() < MASTER_REF_TTL {
                return Ok(reference.clone());
            }
        }

        let reference = self.fetch_master_ref().await?;
        *self.master.write().await = Some((reference.clone(), Instant::now()));
        Ok(reference)
    }

    async fn fetch_master_ref(&self) -> Result<String> {
        let request = self.with_token(self.client.get(&self.endpoint));
        let root: ApiRoot = self.send_json(request).await?;
        root.refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.reference)
            .ok_or(Error::MissingMasterRef)
    }

    fn with_token(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.query(&[("access_token", token.as_str())]),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ContentStore for PrismicClient {
    async fn query(&self, predicate: &Predicate, options: &QueryOptions) -> Result<QueryResponse> {
        let reference = match &options.reference {
            Some(reference) => reference.clone(),
            None => self.master_ref().await?,
        };

        let mut params: Vec<(&str, String)> = vec![("ref", reference), ("q", predicate.to_query())];
        if let Some(page_size) = options.page_size {
            params.push(("pageSize", page_size.to_string()));
        }
        if let Some(page) = options.page {
            params.push(("page", page.to_string()));
        }
        if let Some(after) = &options.after {
            params.push(("after", after.clone()));
        }
        if let Some(orderings) = orderings_param(&options.orderings) {
            params.push(("orderings", orderings));
        }

        tracing::debug!(
            "query {} page_size={:?} after={:?} preview={}",
            predicate.to_query(),
            options.page_size,
            options.after,
            options.reference.is_some()
        );

        let url = format!("{}/documents/search", self.endpoint);
        let request = self.with_token(self.client.get(url).query(&params));
        self.send_json(request).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<QueryResponse> {
        let mut url = Url::parse(cursor).map_err(|_| Error::InvalidCursor(cursor.to_string()))?;

        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }

        tracing::debug!("fetching next page {}", cursor);
        self.send_json(self.client.get(url)).await
    }
}
