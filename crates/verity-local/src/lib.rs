use std::time::Duration;
use verity_core::{Error, FetchBackend, PageContent, Result};

pub mod detect;
pub mod extract;
pub mod model;
pub mod prompt;
pub mod research;
pub mod tools;

/// Plain HTTP fetcher for article URLs.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("verity/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            // Safety defaults: avoid "hang forever" on DNS/TLS/body stalls.
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch_page(&self, url: &str) -> Result<PageContent> {
        let url = url::Url::parse(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let html = resp.text().await.map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(extract::page_content(&html))
    }
}
