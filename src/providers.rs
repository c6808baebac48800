//! News providers queried by the aggregator.
//!
//! Each provider answers with its own JSON envelope and field names. The
//! response schemas below are decoded into [`ProviderPayload`] and adapted to
//! [`NewsArticle`] before anything gets merged.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::article::NewsArticle;
use crate::config::ProviderConfig;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no API key configured for {0}")]
    MissingCredential(Provider),
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} answered with HTTP {status}")]
    Status { provider: Provider, status: StatusCode },
    #[error("could not decode {provider} response: {source}")]
    Decode {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Technology-category news; results need client-side keyword filtering
    NewsData,
    /// Full-text search with an OR-joined keyword query
    NewsApi,
    /// Keyword search with comma-joined keywords
    Mediastack,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::NewsData => write!(f, "newsdata"),
            Provider::NewsApi => write!(f, "newsapi"),
            Provider::Mediastack => write!(f, "mediastack"),
        }
    }
}

/// How a request constrains results by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query<'a> {
    Keywords(&'a [String]),
    Unconstrained,
}

impl Provider {
    /// Query string for one request against this provider.
    pub fn query_params(&self, api_key: &str, query: Query<'_>) -> Vec<(&'static str, String)> {
        match self {
            Provider::NewsData => vec![
                ("apikey", api_key.to_string()),
                ("category", "technology".to_string()),
                ("language", "en".to_string()),
            ],
            Provider::NewsApi => {
                let mut params = Vec::with_capacity(4);
                if let Query::Keywords(keywords) = query {
                    params.push(("q", or_query(keywords)));
                }
                params.push(("language", "en".to_string()));
                params.push(("sortBy", "publishedAt".to_string()));
                params.push(("apiKey", api_key.to_string()));
                params
            }
            Provider::Mediastack => {
                let mut params = vec![("access_key", api_key.to_string())];
                if let Query::Keywords(keywords) = query {
                    params.push(("keywords", keywords.join(",")));
                }
                params.push(("languages", "en".to_string()));
                params
            }
        }
    }

    /// Whether the provider's results must be keyword-filtered after fetching.
    pub fn needs_keyword_filter(&self) -> bool {
        matches!(self, Provider::NewsData)
    }

    async fn decode(&self, response: reqwest::Response) -> Result<ProviderPayload, reqwest::Error> {
        Ok(match self {
            Provider::NewsData => ProviderPayload::NewsData(response.json().await?),
            Provider::NewsApi => ProviderPayload::NewsApi(response.json().await?),
            Provider::Mediastack => ProviderPayload::Mediastack(response.json().await?),
        })
    }
}

fn or_query(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|k| {
            if k.contains(' ') {
                format!("\"{}\"", k)
            } else {
                k.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// One decoded provider response.
#[derive(Debug, Clone)]
pub enum ProviderPayload {
    NewsData(NewsDataResponse),
    NewsApi(NewsApiResponse),
    Mediastack(MediastackResponse),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsDataResponse {
    #[serde(default)]
    pub results: Vec<NewsDataArticle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsDataArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
    pub link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsApiResponse {
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediastackResponse {
    #[serde(default)]
    pub data: Vec<MediastackArticle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediastackArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<NewsDataArticle> for NewsArticle {
    fn from(a: NewsDataArticle) -> Self {
        NewsArticle {
            title: a.title,
            description: a.description,
            pub_date: a.pub_date,
            link: a.link,
            extra: a.extra,
        }
    }
}

impl From<NewsApiArticle> for NewsArticle {
    fn from(a: NewsApiArticle) -> Self {
        NewsArticle {
            title: a.title,
            description: a.description,
            pub_date: a.published_at,
            link: a.url,
            extra: a.extra,
        }
    }
}

impl From<MediastackArticle> for NewsArticle {
    fn from(a: MediastackArticle) -> Self {
        NewsArticle {
            title: a.title,
            description: a.description,
            pub_date: a.published_at,
            link: a.url,
            extra: a.extra,
        }
    }
}

impl ProviderPayload {
    pub fn into_articles(self) -> Vec<NewsArticle> {
        match self {
            ProviderPayload::NewsData(r) => r.results.into_iter().map(Into::into).collect(),
            ProviderPayload::NewsApi(r) => r.articles.into_iter().map(Into::into).collect(),
            ProviderPayload::Mediastack(r) => r.data.into_iter().map(Into::into).collect(),
        }
    }
}

/// Issue one request against a provider and adapt the response.
pub async fn fetch(
    client: &Client,
    provider: Provider,
    config: &ProviderConfig,
    query: Query<'_>,
) -> Result<Vec<NewsArticle>, ProviderError> {
    let api_key = config
        .credential()
        .ok_or(ProviderError::MissingCredential(provider))?;

    let response = client
        .get(&config.base_url)
        .query(&provider.query_params(api_key, query))
        .send()
        .await
        .map_err(|source| ProviderError::Transport { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status { provider, status });
    }

    let payload = provider
        .decode(response)
        .await
        .map_err(|source| ProviderError::Decode { provider, source })?;

    Ok(payload.into_articles())
}
