//! Robots.txt handling module
//!
//! The crawl touches a single site, so robots.txt is fetched once from the
//! base URL's origin before the first request and kept for the whole run.

mod policy;

pub use policy::RobotsPolicy;

use reqwest::Client;
use url::Url;

/// Fetches and parses robots.txt for the origin of `base_url`
///
/// A missing file, a non-success status or a transport error all yield an
/// allow-all policy; robots.txt never stops a crawl from starting.
pub async fn fetch_robots(client: &Client, base_url: &Url) -> RobotsPolicy {
    let robots_url = match base_url.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL from {}: {}", base_url, e);
            return RobotsPolicy::allow_all();
        }
    };

    tracing::debug!("Fetching {}", robots_url);

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", robots_url, e);
            return RobotsPolicy::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "{} returned HTTP {}, allowing all",
            robots_url,
            response.status().as_u16()
        );
        return RobotsPolicy::allow_all();
    }

    match response.text().await {
        Ok(body) => RobotsPolicy::from_content(&body),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", robots_url, e);
            RobotsPolicy::allow_all()
        }
    }
}
