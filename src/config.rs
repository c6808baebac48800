use anyhow::{anyhow, ensure};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "cyber",
    "scam",
    "fraud",
    "phishing",
    "ransomware",
    "malware",
    "data breach",
    "hacked",
    "security",
    "otp",
    "upi",
    "identity theft",
    "bank fraud",
];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Refresh interval in minutes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Feed endpoint the poller calls; the aggregator is used in-process when unset
    #[serde(default)]
    pub feed_endpoint: Option<String>,
    #[serde(default = "default_fallback_link")]
    pub fallback_link: String,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

fn default_refresh_interval() -> u64 {
    3
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_fallback_link() -> String {
    "https://www.cisa.gov/news-events/cybersecurity-advisories".to_string()
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default = "ProviderConfig::newsdata")]
    pub newsdata: ProviderConfig,
    #[serde(default = "ProviderConfig::newsapi")]
    pub newsapi: ProviderConfig,
    #[serde(default = "ProviderConfig::mediastack")]
    pub mediastack: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            newsdata: ProviderConfig::newsdata(),
            newsapi: ProviderConfig::newsapi(),
            mediastack: ProviderConfig::mediastack(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    fn newsdata() -> Self {
        Self {
            base_url: "https://newsdata.io/api/1/news".to_string(),
            api_key: None,
        }
    }

    fn newsapi() -> Self {
        Self {
            base_url: "https://newsapi.org/v2/everything".to_string(),
            api_key: None,
        }
    }

    fn mediastack() -> Self {
        Self {
            base_url: "http://api.mediastack.com/v1/news".to_string(),
            api_key: None,
        }
    }

    /// The credential, treating blank values as missing
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.refresh_period()?;
        Ok(config)
    }

    /// Poll period derived from `refresh_interval`, which must be at least one
    /// minute and fit in seconds.
    pub fn refresh_period(&self) -> anyhow::Result<Duration> {
        ensure!(
            self.refresh_interval > 0,
            "refresh_interval must be at least 1 minute"
        );
        let secs = self
            .refresh_interval
            .checked_mul(60)
            .ok_or_else(|| anyhow!("refresh_interval of {} minutes is too large", self.refresh_interval))?;
        Ok(Duration::from_secs(secs))
    }

    /// Overlay provider credentials from the process environment
    pub fn with_env_credentials(self) -> Self {
        self.with_credentials_from(|name| std::env::var(name).ok())
    }

    pub fn with_credentials_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots = [
            ("NEWSDATA_API_KEY", &mut self.providers.newsdata),
            ("NEWSAPI_API_KEY", &mut self.providers.newsapi),
            ("MEDIASTACK_API_KEY", &mut self.providers.mediastack),
        ];
        for (var, provider) in slots {
            if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
                provider.api_key = Some(key);
            }
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            bind_addr: default_bind_addr(),
            feed_endpoint: None,
            fallback_link: default_fallback_link(),
            keywords: default_keywords(),
            request_timeout_secs: default_request_timeout(),
            providers: ProvidersConfig::default(),
        }
    }
}
