use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical article shape shared by the aggregator, the feed endpoint and
/// the poller. Provider-specific fields ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "pubDate", default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the feed endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsResponse {
    pub news: Vec<NewsArticle>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl NewsArticle {
    /// Trimmed, lowercased title used to collapse duplicates across providers.
    pub fn dedup_key(&self) -> Option<String> {
        non_blank(self.title.as_deref()).map(str::to_lowercase)
    }

    /// Title, description and publish date are all present and non-blank.
    pub fn is_well_formed(&self) -> bool {
        non_blank(self.title.as_deref()).is_some()
            && non_blank(self.description.as_deref()).is_some()
            && non_blank(self.pub_date.as_deref()).is_some()
    }

    /// Case-insensitive substring match of any keyword against title or description.
    pub fn matches_any(&self, keywords: &[String]) -> bool {
        let title = self.title.as_deref().unwrap_or_default().to_lowercase();
        let description = self
            .description
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        keywords.iter().any(|keyword| {
            let keyword = keyword.to_lowercase();
            title.contains(&keyword) || description.contains(&keyword)
        })
    }
}
