use super::{RawResponse, SyncPort};
use crate::attributes::Record;
use crate::config::TetherConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use std::marker::PhantomData;
use tracing::debug;

/// [`SyncPort`] over HTTP for the resource collection at `base_url`.
pub struct ApiSync<T> {
    base_url: String,
    client: Client,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> ApiSync<T> {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Shares an existing client (and its connection pool).
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client,
            _record: PhantomData,
        }
    }

    /// Port for the resource registered under `name` in `config`.
    pub fn from_config(config: &TetherConfig, name: &str) -> Result<Self> {
        Ok(Self::new(config.resource_url(name)?))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/{}", self.base_url, id)
    }

    pub fn fetch_request(&self, id: u64) -> RequestBuilder {
        self.client.get(self.item_url(id))
    }

    pub fn fetch_all_request(&self) -> RequestBuilder {
        self.client.get(&self.base_url)
    }

    /// PUT to the item URL when `data` has an id, POST to the base otherwise.
    pub fn save_request(&self, data: &T) -> Result<RequestBuilder> {
        let body = serde_json::to_string(data)?;
        let builder = match data.id() {
            Some(id) => self.client.put(self.item_url(id)),
            None => self.client.post(&self.base_url),
        };
        Ok(builder.header(CONTENT_TYPE, "application/json").body(body))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<RawResponse> {
        let request = builder.build()?;
        debug!(method = %request.method(), url = %request.url(), "sync request");

        let response = self.client.execute(request).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, "sync response");

        Ok(RawResponse { status, body })
    }
}

#[async_trait(?Send)]
impl<T: Record> SyncPort<T> for ApiSync<T> {
    async fn fetch(&self, id: u64) -> Result<RawResponse> {
        self.execute(self.fetch_request(id)).await
    }

    async fn fetch_all(&self) -> Result<RawResponse> {
        self.execute(self.fetch_all_request()).await
    }

    async fn save(&self, data: &T) -> Result<RawResponse> {
        let builder = self.save_request(data)?;
        self.execute(builder).await
    }
}
