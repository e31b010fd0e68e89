//! Collaborator implementations wired into `CompetitorFetcher` for this
//! binary: a real stateless HTTP fetcher, and a browser-automation stub.
//!
//! Browser automation for discovery/publishing is explicitly out of
//! `blog-content-core`'s scope (it only specifies the `BrowserSession`
//! interface); this thin CLI never implements one, so the browser fallback
//! path always fails here and enrichment relies entirely on the HTTP path.

use async_trait::async_trait;
use blog_content_core::error::EnrichmentError;
use blog_content_core::fetch::{BrowserSession, HtmlFetcher};
use std::time::Duration;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client configuration is valid");
        Self { client }
    }
}

#[async_trait]
impl HtmlFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<String, EnrichmentError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EnrichmentError::Http(e.to_string()))?;
        response.text().await.map_err(|e| EnrichmentError::Http(e.to_string()))
    }
}

pub struct UnavailableBrowserSession;

#[async_trait]
impl BrowserSession for UnavailableBrowserSession {
    async fn open_session(&self) -> Result<(), EnrichmentError> {
        Ok(())
    }

    async fn close_session(&self) -> Result<(), EnrichmentError> {
        Ok(())
    }

    async fn search_posts_by_keyword(
        &self,
        _keyword: &str,
        _max_results: usize,
    ) -> Result<Vec<(String, String)>, EnrichmentError> {
        Err(EnrichmentError::Browser(
            "이 CLI는 브라우저 자동화를 지원하지 않습니다".into(),
        ))
    }

    async fn fetch_post_dom(&self, _url: &str) -> Result<String, EnrichmentError> {
        Err(EnrichmentError::Browser(
            "이 CLI는 브라우저 자동화를 지원하지 않습니다".into(),
        ))
    }

    async fn force_stop(&self) {}
}
