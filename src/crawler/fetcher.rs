//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the crawler's identity and headers
//! - GET requests for index pages
//! - Retry logic for transient failures
//! - Error classification

use crate::config::{Config, RetryConfig};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL,
    UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 5;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
        /// Attempts it took, including the successful one
        attempts: u32,
    },

    /// Non-success status that is not worth retrying (e.g. 404)
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Transient failure that persisted through every retry
    Failed {
        /// Description of the last failure
        error: String,
        /// Attempts made
        attempts: u32,
    },
}

/// Builds an HTTP client with proper configuration
///
/// The client identifies itself with the configured user agent, sends
/// browser-like request headers, keeps no cookies and follows up to five
/// redirects.
///
/// # Example
///
/// ```no_run
/// use atc_spider::config::Config;
/// use atc_spider::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.name.as_str())
        .default_headers(default_headers())
        .timeout(Duration::from_secs(config.crawler.download_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Headers sent with every request
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

/// Fetches a URL, retrying transient failures
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Success |
/// | Status in `retry.http_codes` | Retry, then → Failed |
/// | Other non-2xx status | Immediate → HttpError |
/// | Timeout / connection error | Retry, then → Failed |
/// | Body read error | Retry, then → Failed |
/// | Other client error | Immediate → Failed |
///
/// Retries are issued immediately; politeness delays apply between
/// requests, not between attempts of the same request.
pub async fn fetch_url(client: &Client, url: &Url, retry: &RetryConfig) -> FetchResult {
    let max_attempts = retry.max_attempts();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let can_retry = attempts < max_attempts;

        let error = match client.get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                let final_url = response.url().clone();

                if status.is_success() {
                    match response.text().await {
                        Ok(body) => {
                            return FetchResult::Success {
                                final_url,
                                status_code: status.as_u16(),
                                body,
                                attempts,
                            }
                        }
                        Err(e) => format!("Failed to read body: {}", e),
                    }
                } else if retry.is_retry_status(status.as_u16()) {
                    format!("HTTP {}", status.as_u16())
                } else {
                    return FetchResult::HttpError {
                        status_code: status.as_u16(),
                    };
                }
            }
            Err(e) if is_transient(&e) => describe_error(&e),
            Err(e) => {
                return FetchResult::Failed {
                    error: describe_error(&e),
                    attempts,
                }
            }
        };

        if !can_retry {
            tracing::debug!(
                "Gave up retrying {} (failed {} times): {}",
                url,
                attempts,
                error
            );
            return FetchResult::Failed { error, attempts };
        }

        tracing::debug!(
            "Retrying {} (failed {} times): {}",
            url,
            attempts,
            error
        );
    }
}

/// Returns true for errors worth retrying
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&Config::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_default_headers() {
        let headers = default_headers();
        assert_eq!(headers.get(ACCEPT_LANGUAGE).unwrap(), "en-US,en;q=0.5");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "max-age=0");
    }
}
