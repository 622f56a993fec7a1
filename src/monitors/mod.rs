//! Concrete monitor implementations and registry construction.

mod link_scrape;

use std::sync::Arc;

pub use link_scrape::{LinkScrapeConfig, LinkScrapeMonitor};
use reqwest_middleware::ClientWithMiddleware;

use crate::monitor::Monitor;

/// Builds the monitor registry in declaration order.
///
/// When no monitors are configured, the built-in set (the Bedrock server
/// monitor) is registered instead, so a bare config still monitors something.
pub fn build_registry(
    configs: &[LinkScrapeConfig],
    client: Arc<ClientWithMiddleware>,
) -> Vec<Arc<dyn Monitor>> {
    if configs.is_empty() {
        return vec![Arc::new(LinkScrapeMonitor::new(LinkScrapeConfig::bedrock_server(), client))];
    }

    configs
        .iter()
        .map(|config| {
            Arc::new(LinkScrapeMonitor::new(config.clone(), Arc::clone(&client)))
                as Arc<dyn Monitor>
        })
        .collect()
}
