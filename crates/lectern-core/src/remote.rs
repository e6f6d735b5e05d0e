//! Remote content-engine adapter
//!
//! Talks JSON over HTTP to a hosted content engine. This is the handle the
//! session falls back to when the local database is stale, missing, or
//! failing.

use async_trait::async_trait;
use tracing::debug;

use crate::engine::{
    Book, ContentEngine, DictionaryEntry, EngineResult, Phrase, RangeData, RangeQuery,
    ReferenceRange, VersionInfo,
};
use crate::error::EngineError;
use crate::v11n::V11nRule;

/// Environment variable naming the remote engine endpoint.
pub const REMOTE_URL_ENV: &str = "LECTERN_ENGINE_URL";

/// Remote engine configuration.
#[derive(Debug, Clone)]
pub struct RemoteEngineConfig {
    /// Engine base URL, without a trailing slash
    pub base_url: String,
}

impl RemoteEngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        RemoteEngineConfig { base_url }
    }

    /// Read the endpoint from `LECTERN_ENGINE_URL`.
    pub fn from_env() -> Option<Self> {
        std::env::var(REMOTE_URL_ENV).ok().map(Self::new)
    }
}

/// HTTP client for a hosted content engine.
pub struct HttpContentEngine {
    config: RemoteEngineConfig,
    client: reqwest::Client,
}

impl HttpContentEngine {
    pub fn new(config: RemoteEngineConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        HttpContentEngine { config, client }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn expect_success(response: reqwest::Response) -> EngineResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(EngineError::Endpoint {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ContentEngine for HttpContentEngine {
    async fn full_data_for_reference_range(&self, range: &RangeQuery) -> EngineResult<RangeData> {
        debug!(
            version = %range.version_uid,
            book = %range.book_osis_id,
            chapter = range.chapter_num,
            "remote ref-range query"
        );
        let response = self
            .client
            .post(self.url("/ref-range"))
            .json(range)
            .send()
            .await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    async fn books_for_version(&self, version_index: u32) -> EngineResult<Vec<Book>> {
        let response = self
            .client
            .get(self.url(&format!("/versions/{version_index}/books")))
            .send()
            .await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    async fn versions(&self) -> EngineResult<Vec<VersionInfo>> {
        let response = self.client.get(self.url("/versions")).send().await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    async fn phrases(&self, range: &ReferenceRange) -> EngineResult<Vec<Phrase>> {
        let response = self
            .client
            .post(self.url("/phrases"))
            .json(range)
            .send()
            .await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    async fn dictionary_entries(
        &self,
        strong: &str,
        dictionary: &str,
    ) -> EngineResult<Vec<DictionaryEntry>> {
        let response = self
            .client
            .get(self.url(&format!("/dictionary/{strong}")))
            .query(&[("dictionary", dictionary)])
            .send()
            .await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    async fn add_v11n_rules(&self, rules: Vec<V11nRule>) -> EngineResult<()> {
        let response = self
            .client
            .post(self.url("/v11n-rules"))
            .json(&rules)
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}
