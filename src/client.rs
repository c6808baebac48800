use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::debug;

use crate::article::{NewsArticle, NewsResponse};
use crate::poller::NewsSource;

/// Reads the aggregated feed from the `/api/news` endpoint.
pub struct FeedClient {
    client: Client,
    endpoint: String,
}

impl FeedClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("ThreatFeed/1.0 (Feed Poller)")
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl NewsSource for FeedClient {
    async fn fetch_news(&self) -> anyhow::Result<Vec<NewsArticle>> {
        // Cache-buster so intermediaries never serve a stale feed
        let buster = Utc::now().timestamp_millis().to_string();
        debug!("Fetching feed from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("t", buster)])
            .send()
            .await?
            .error_for_status()?;

        let body: NewsResponse = response.json().await?;
        Ok(body.news)
    }
}
