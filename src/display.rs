//! Turns aggregator output into the "latest 3" view shown by the feed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::article::NewsArticle;

pub const DISPLAY_LIMIT: usize = 3;

pub const SAFETY_TIPS: &[&str] = &[
    "Never share an OTP or UPI PIN, not even with someone claiming to be your bank.",
    "Check the sender's address and hover over links before clicking.",
    "Turn on two-factor authentication for email and banking accounts.",
    "Verify urgent payment requests through a number you already trust.",
    "Keep your phone and browser updated to close known security holes.",
];

static SCAM_ALERT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)high|critical|scam|fraud|phishing|ransomware").unwrap());
static CAUTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)caution|medium|warning").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    ScamAlert,
    Caution,
    SafeTip,
}

impl Severity {
    pub fn classify(text: &str) -> Self {
        if SCAM_ALERT.is_match(text) {
            Severity::ScamAlert
        } else if CAUTION.is_match(text) {
            Severity::Caution
        } else {
            Severity::SafeTip
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::ScamAlert => "Scam Alert",
            Severity::Caution => "Caution",
            Severity::SafeTip => "Safe Tip",
        }
    }

    /// CSS class used by the templates
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::ScamAlert => "severity-alert",
            Severity::Caution => "severity-caution",
            Severity::SafeTip => "severity-tip",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub title: String,
    pub description: String,
    pub pub_date: String,
    pub published: Option<DateTime<Utc>>,
    pub link: String,
    pub severity: Severity,
    pub tip: &'static str,
}

/// Parse the publish-date formats the providers emit.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Absolute http(s) URLs pass through, bare hosts get `https://`, blanks and
/// any other scheme get the fallback.
pub fn normalize_link(link: Option<&str>, fallback: &str) -> String {
    let link = match link.map(str::trim).filter(|l| !l.is_empty()) {
        Some(link) => link,
        None => return fallback.to_string(),
    };

    match Url::parse(link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => link.to_string(),
        Ok(_) => fallback.to_string(),
        Err(_) => format!("https://{}", link),
    }
}

pub fn tip_for(index: usize) -> &'static str {
    SAFETY_TIPS[index % SAFETY_TIPS.len()]
}

/// Filter, sort and decorate raw articles for display.
pub fn prepare(articles: &[NewsArticle], fallback_link: &str) -> Vec<DisplayItem> {
    let mut candidates: Vec<(&NewsArticle, Option<DateTime<Utc>>)> = articles
        .iter()
        .filter(|a| a.is_well_formed())
        .map(|a| (a, a.pub_date.as_deref().and_then(parse_pub_date)))
        .collect();

    // Newest first; unparsable dates compare as None, which sorts last when descending
    candidates.sort_by(|(_, a), (_, b)| b.cmp(a));

    candidates
        .into_iter()
        .take(DISPLAY_LIMIT)
        .enumerate()
        .map(|(index, (article, published))| {
            let title = article.title.as_deref().unwrap_or_default().trim().to_string();
            let description = article
                .description
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string();
            let severity = Severity::classify(&format!("{} {}", title, description));

            DisplayItem {
                severity,
                link: normalize_link(article.link.as_deref(), fallback_link),
                pub_date: article.pub_date.clone().unwrap_or_default(),
                published,
                tip: tip_for(index),
                title,
                description,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FALLBACK: &str = "https://fallback.example.org/advisories";

    fn article(title: &str, description: Option<&str>, pub_date: Option<&str>) -> NewsArticle {
        NewsArticle {
            title: Some(title.to_string()),
            description: description.map(String::from),
            pub_date: pub_date.map(String::from),
            ..Default::default()
        }
    }

    mod severity_tests {
        use super::*;

        #[test]
        fn test_scam_alert_tier() {
            assert_eq!(Severity::classify("Ransomware hits bank"), Severity::ScamAlert);
        }

        #[test]
        fn test_caution_tier() {
            assert_eq!(Severity::classify("Caution: new scheme"), Severity::Caution);
        }

        #[test]
        fn test_safe_tip_tier() {
            assert_eq!(
                Severity::classify("Free webinar on safe browsing"),
                Severity::SafeTip
            );
        }

        #[test]
        fn test_scam_alert_checked_before_caution() {
            assert_eq!(
                Severity::classify("Warning: phishing texts spreading"),
                Severity::ScamAlert
            );
        }

        #[test]
        fn test_labels() {
            assert_eq!(Severity::ScamAlert.label(), "Scam Alert");
            assert_eq!(Severity::Caution.label(), "Caution");
            assert_eq!(Severity::SafeTip.label(), "Safe Tip");
        }
    }

    mod link_tests {
        use super::*;

        #[test]
        fn test_bare_host_gets_https() {
            assert_eq!(
                normalize_link(Some("example.com/a"), FALLBACK),
                "https://example.com/a"
            );
        }

        #[test]
        fn test_absolute_url_unchanged() {
            assert_eq!(
                normalize_link(Some("https://example.com/a"), FALLBACK),
                "https://example.com/a"
            );
        }

        #[test]
        fn test_missing_or_blank_uses_fallback() {
            assert_eq!(normalize_link(None, FALLBACK), FALLBACK);
            assert_eq!(normalize_link(Some(""), FALLBACK), FALLBACK);
            assert_eq!(normalize_link(Some("   "), FALLBACK), FALLBACK);
        }

        #[test]
        fn test_plain_http_unchanged() {
            assert_eq!(
                normalize_link(Some("http://example.com/a"), FALLBACK),
                "http://example.com/a"
            );
        }

        #[test]
        fn test_script_and_data_schemes_use_fallback() {
            assert_eq!(normalize_link(Some("javascript:alert(1)"), FALLBACK), FALLBACK);
            assert_eq!(
                normalize_link(Some("data:text/html,<script>alert(1)</script>"), FALLBACK),
                FALLBACK
            );
            assert_eq!(normalize_link(Some("ftp://example.com/file"), FALLBACK), FALLBACK);
        }
    }

    mod date_tests {
        use super::*;

        #[test]
        fn test_parses_provider_formats() {
            let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();

            assert_eq!(parse_pub_date("2024-03-01T10:30:00Z"), Some(expected));
            assert_eq!(parse_pub_date("2024-03-01T10:30:00+00:00"), Some(expected));
            assert_eq!(parse_pub_date("2024-03-01 10:30:00"), Some(expected));
            assert_eq!(parse_pub_date("Fri, 01 Mar 2024 10:30:00 +0000"), Some(expected));
        }

        #[test]
        fn test_parses_bare_date_as_midnight() {
            assert_eq!(
                parse_pub_date("2024-01-01"),
                Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            );
        }

        #[test]
        fn test_garbage_is_none() {
            assert_eq!(parse_pub_date("last tuesday"), None);
        }
    }

    mod prepare_tests {
        use super::*;

        #[test]
        fn test_sorts_newest_first() {
            let articles = vec![
                article("Jan", Some("d"), Some("2024-01-01")),
                article("Mar", Some("d"), Some("2024-03-01")),
                article("Feb", Some("d"), Some("2024-02-01")),
            ];

            let items = prepare(&articles, FALLBACK);
            let dates: Vec<_> = items.iter().map(|i| i.pub_date.as_str()).collect();
            assert_eq!(dates, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
        }

        #[test]
        fn test_excludes_missing_description() {
            let articles = vec![
                article("No description", None, Some("2024-05-01")),
                article("Complete", Some("d"), Some("2024-04-01")),
            ];

            let items = prepare(&articles, FALLBACK);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].title, "Complete");
        }

        #[test]
        fn test_truncates_to_three() {
            let articles: Vec<_> = (1..=6)
                .map(|m| article(&format!("Month {}", m), Some("d"), Some(&format!("2023-0{}-01", m))))
                .collect();

            let items = prepare(&articles, FALLBACK);
            assert_eq!(items.len(), DISPLAY_LIMIT);
            assert_eq!(items[0].title, "Month 6");
        }

        #[test]
        fn test_unparsable_dates_sort_last() {
            let articles = vec![
                article("Garbage", Some("d"), Some("not a date")),
                article("Dated", Some("d"), Some("2020-01-01")),
            ];

            let items = prepare(&articles, FALLBACK);
            assert_eq!(items[0].title, "Dated");
            assert_eq!(items[1].title, "Garbage");
            assert_eq!(items[1].published, None);
        }

        #[test]
        fn test_recent_article_leads_without_evicting_older_ones() {
            let articles = vec![
                article("Two days old", Some("d"), Some("2024-05-30T12:00:00Z")),
                article("Fresh", Some("d"), Some("2024-06-01T08:00:00Z")),
                article("Three days old", Some("d"), Some("2024-05-29T12:00:00Z")),
            ];

            let items = prepare(&articles, FALLBACK);
            let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
            assert_eq!(titles, vec!["Fresh", "Two days old", "Three days old"]);
        }

        #[test]
        fn test_unparsable_date_fills_remaining_slot() {
            let articles = vec![
                article("Garbage", Some("d"), Some("sometime")),
                article("Fresh", Some("d"), Some("2024-06-01T08:00:00Z")),
            ];

            let items = prepare(&articles, FALLBACK);
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].title, "Fresh");
            assert_eq!(items[1].title, "Garbage");
        }

        #[test]
        fn test_tips_rotate_by_position() {
            let articles = vec![
                article("A", Some("d"), Some("2024-03-01")),
                article("B", Some("d"), Some("2024-02-01")),
                article("C", Some("d"), Some("2024-01-01")),
            ];

            let items = prepare(&articles, FALLBACK);
            for (index, item) in items.iter().enumerate() {
                assert_eq!(item.tip, SAFETY_TIPS[index]);
            }
            assert_eq!(tip_for(SAFETY_TIPS.len() + 1), SAFETY_TIPS[1]);
        }

        #[test]
        fn test_decorates_severity_and_link() {
            let mut scam = article("Fake refund calls", Some("A bank fraud wave"), Some("2024-03-01"));
            scam.link = Some("news.example.com/refunds".to_string());

            let items = prepare(&[scam], FALLBACK);
            assert_eq!(items[0].severity, Severity::ScamAlert);
            assert_eq!(items[0].link, "https://news.example.com/refunds");
        }

        #[test]
        fn test_empty_input() {
            assert!(prepare(&[], FALLBACK).is_empty());
        }
    }
}
