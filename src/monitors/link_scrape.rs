//! A monitor that scrapes a web page and watches its first matching link.
//!
//! The selection policy is the generalizable contract of every "scrape and
//! filter links" monitor: a link qualifies when its absolute URL contains ALL
//! required substrings and NONE of the excluded substrings, case-insensitive.
//! The concrete substring sets, headers, and URL are per-monitor
//! configuration, not core logic.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use reqwest::header::{REFERER, USER_AGENT};
use reqwest_middleware::ClientWithMiddleware;
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::monitor::{FetchError, Monitor};

/// Configuration for one link-scrape monitor.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkScrapeConfig {
    /// Stable key into baseline storage. Unique across all monitors.
    pub identity: String,
    /// Human-readable name for logs and the heartbeat listing.
    pub display_name: String,
    /// Page to fetch and scan for links.
    pub url: String,
    /// User-Agent header to present, when the source requires a browser-like
    /// client.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Referer header to present.
    #[serde(default)]
    pub referer: Option<String>,
    /// Additional discovery headers sent verbatim with the request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// A link qualifies only if its absolute URL contains every one of these,
    /// case-insensitive.
    pub required_substrings: Vec<String>,
    /// A link is disqualified if its absolute URL contains any of these,
    /// case-insensitive.
    #[serde(default)]
    pub excluded_substrings: Vec<String>,
    /// Requires the transport to negotiate HTTP/2; anything less surfaces as
    /// a protocol mismatch for that run.
    #[serde(default)]
    pub require_http2: bool,
}

impl LinkScrapeConfig {
    /// The built-in Bedrock dedicated-server monitor: watches the Minecraft
    /// download page for the current Linux server archive.
    pub fn bedrock_server() -> Self {
        Self {
            identity: "minecraft.dat".to_string(),
            display_name: "Minecraft Current Bedrock Server".to_string(),
            url: "https://www.minecraft.net/en-us/download/server/bedrock".to_string(),
            user_agent: Some(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/136.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            referer: Some(
                "https://feedback.minecraft.net/hc/en-us/sections/360001186971-Release-Changelogs"
                    .to_string(),
            ),
            headers: HashMap::from([(
                "X-Requested-With".to_string(),
                "XMLHttpRequest".to_string(),
            )]),
            required_substrings: vec![
                "bedrock".to_string(),
                "linux".to_string(),
                ".zip".to_string(),
            ],
            excluded_substrings: vec!["preview".to_string()],
            require_http2: true,
        }
    }
}

/// A `Monitor` that fetches a page, filters its links, and reports the first
/// match rendered as `- <text> (<url>)`.
pub struct LinkScrapeMonitor {
    config: LinkScrapeConfig,
    client: Arc<ClientWithMiddleware>,
}

impl LinkScrapeMonitor {
    /// Creates a new monitor from its configuration and the shared client.
    pub fn new(config: LinkScrapeConfig, client: Arc<ClientWithMiddleware>) -> Self {
        Self { config, client }
    }

    /// Scans the document for qualifying links, rendering each as
    /// `- <visible text> (<absolute url>)` in document order.
    fn extract_entries(&self, body: &str) -> Result<Vec<String>, FetchError> {
        let selector = Selector::parse("a")
            .map_err(|e| FetchError::Extraction(format!("invalid link selector: {e}")))?;
        let base = Url::parse(&self.config.url)
            .map_err(|e| FetchError::Extraction(format!("invalid base url: {e}")))?;

        let document = Html::parse_document(body);
        let mut entries = Vec::new();

        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            // Links that resolve to nothing sensible are skipped, not errors.
            let Ok(absolute) = base.join(href) else {
                continue;
            };

            let candidate = absolute.as_str().to_lowercase();
            let required_met = self
                .config
                .required_substrings
                .iter()
                .all(|needle| candidate.contains(&needle.to_lowercase()));
            let excluded_hit = self
                .config
                .excluded_substrings
                .iter()
                .any(|needle| candidate.contains(&needle.to_lowercase()));
            if !required_met || excluded_hit {
                continue;
            }

            let text: Vec<&str> = element.text().collect();
            let text = text.join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            entries.push(format!("- {} ({})", text, absolute));
        }

        Ok(entries)
    }
}

#[async_trait]
impl Monitor for LinkScrapeMonitor {
    fn identity(&self) -> &str {
        &self.config.identity
    }

    fn display_name(&self) -> &str {
        &self.config.display_name
    }

    async fn fetch_current_value(&self) -> Result<String, FetchError> {
        tracing::debug!(url = %self.config.url, "Fetching page for link scan.");

        let mut request = self.client.get(&self.config.url);
        if let Some(user_agent) = &self.config.user_agent {
            request = request.header(USER_AGENT, user_agent);
        }
        if let Some(referer) = &self.config.referer {
            request = request.header(REFERER, referer);
        }
        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response =
            request.send().await.map_err(|e| FetchError::Network(e.to_string()))?;

        if self.config.require_http2 && response.version() != reqwest::Version::HTTP_2 {
            return Err(FetchError::ProtocolMismatch(format!(
                "negotiated {:?}, HTTP/2 required",
                response.version()
            )));
        }

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Upstream(status));
        }

        let body = response.text().await.map_err(|e| FetchError::Network(e.to_string()))?;
        let entries = self.extract_entries(&body)?;
        tracing::debug!(url = %self.config.url, matches = entries.len(), "Link scan finished.");

        entries.into_iter().next().ok_or_else(|| {
            FetchError::Extraction(format!("no links matched the filter on {}", self.config.url))
        })
    }
}
