use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::article::NewsArticle;
use crate::config::{Config, ProvidersConfig};
use crate::providers::{self, Provider, ProviderError, Query};

/// Maximum number of raw provider-3 results returned by the fallback path.
pub const FALLBACK_LIMIT: usize = 3;

pub struct Aggregator {
    client: Client,
    providers: ProvidersConfig,
    keywords: Vec<String>,
}

impl Aggregator {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("ThreatFeed/1.0 (News Aggregator)")
            .build()?;

        Ok(Self {
            client,
            providers: config.providers.clone(),
            keywords: config.keywords.clone(),
        })
    }

    /// Query all providers and return a merged, deduplicated list of
    /// cyber-security news. Provider failures degrade to empty contributions;
    /// this never fails.
    pub async fn fetch_cyber_news(&self) -> Vec<NewsArticle> {
        let (tech, search, keyword) = tokio::join!(
            self.fetch_or_empty(Provider::NewsData, Query::Keywords(&self.keywords)),
            self.fetch_or_empty(Provider::NewsApi, Query::Keywords(&self.keywords)),
            self.fetch_or_empty(Provider::Mediastack, Query::Keywords(&self.keywords)),
        );

        let tech = filter_by_keywords(tech, &self.keywords);
        let merged = merge_dedup([tech, search, keyword]);

        if !merged.is_empty() {
            info!("Aggregated {} articles", merged.len());
            return merged;
        }

        if self.providers.mediastack.credential().is_none() {
            return merged;
        }

        info!("No articles after filtering, trying raw {} results", Provider::Mediastack);
        let raw = self
            .fetch_or_empty(Provider::Mediastack, Query::Unconstrained)
            .await;
        with_fallback(merged, raw)
    }

    async fn fetch_or_empty(&self, provider: Provider, query: Query<'_>) -> Vec<NewsArticle> {
        let config = match provider {
            Provider::NewsData => &self.providers.newsdata,
            Provider::NewsApi => &self.providers.newsapi,
            Provider::Mediastack => &self.providers.mediastack,
        };

        match providers::fetch(&self.client, provider, config, query).await {
            Ok(articles) => {
                debug!("{} returned {} articles", provider, articles.len());
                articles
            }
            Err(ProviderError::MissingCredential(_)) => {
                debug!("Skipping {}: no API key configured", provider);
                Vec::new()
            }
            Err(e) => {
                warn!("Provider {} unavailable: {}", provider, e);
                Vec::new()
            }
        }
    }
}

/// Keep only articles whose title or description mentions an allowlisted keyword.
pub fn filter_by_keywords(articles: Vec<NewsArticle>, keywords: &[String]) -> Vec<NewsArticle> {
    articles
        .into_iter()
        .filter(|a| a.matches_any(keywords))
        .collect()
}

/// Concatenate in provider order and keep the first article per dedup key.
/// Articles without a title are dropped.
pub fn merge_dedup<I>(lists: I) -> Vec<NewsArticle>
where
    I: IntoIterator<Item = Vec<NewsArticle>>,
{
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|article| match article.dedup_key() {
            Some(key) => seen.insert(key),
            None => false,
        })
        .collect()
}

/// Substitute up to [`FALLBACK_LIMIT`] raw results when nothing survived the merge.
pub fn with_fallback(merged: Vec<NewsArticle>, raw: Vec<NewsArticle>) -> Vec<NewsArticle> {
    if merged.is_empty() && !raw.is_empty() {
        raw.into_iter().take(FALLBACK_LIMIT).collect()
    } else {
        merged
    }
}
