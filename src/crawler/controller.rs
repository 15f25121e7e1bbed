//! Recursion control: which child pages to request next
//!
//! The controller turns the section-header links of a page into child
//! requests, one level deeper than the page itself, and stops recursing at
//! the configured maximum depth.

use crate::config::{clamp_depth, SiteConfig};
use crate::crawler::extractor::PageNode;
use crate::url::{child_url, is_offsite};
use crate::AtcError;
use url::Url;

/// A page to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// The URL to fetch
    pub url: Url,

    /// Link distance from the index page (the index page is 0)
    pub depth: u32,

    /// Whether the page uses the index page layout
    pub is_root_page: bool,
}

impl CrawlRequest {
    /// The request for the index page
    pub fn root(url: Url) -> Self {
        Self {
            url,
            depth: 0,
            is_root_page: true,
        }
    }

    /// A request for a page linked from this one
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth + 1,
            is_root_page: false,
        }
    }
}

/// Child requests for one page, plus what was left out and why
#[derive(Debug, Default)]
pub struct ChildPlan {
    /// Requests to schedule
    pub requests: Vec<CrawlRequest>,

    /// Links not followed because the depth limit was reached
    pub depth_filtered: usize,

    /// Links pointing outside the allowed domains
    pub offsite_filtered: usize,

    /// Links that did not form a valid URL
    pub invalid: usize,
}

/// Decides, per page, whether and where to recurse
#[derive(Debug, Clone)]
pub struct RecursionController {
    base_url: Url,
    allowed_domains: Vec<String>,
    max_depth: u32,
}

impl RecursionController {
    /// Creates a controller for the given site
    ///
    /// `max_depth` is clamped to the supported range.
    pub fn new(site: &SiteConfig, max_depth: u32) -> Result<Self, AtcError> {
        Ok(Self {
            base_url: Url::parse(&site.base_url)?,
            allowed_domains: site
                .allowed_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            max_depth: clamp_depth(max_depth),
        })
    }

    /// The effective maximum depth
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// The request that starts the crawl
    pub fn start_request(&self) -> CrawlRequest {
        CrawlRequest::root(self.base_url.clone())
    }

    /// Returns true if a request at `depth` may still be made
    pub fn within_depth(&self, depth: u32) -> bool {
        depth <= self.max_depth
    }

    /// Returns true if the URL is outside the allowed domains
    pub fn is_offsite(&self, url: &Url) -> bool {
        is_offsite(url, &self.allowed_domains)
    }

    /// Builds the child requests for a processed page
    ///
    /// Leaf pages produce nothing. For pages with section-header links, one
    /// request per link is built unless the children would exceed the depth
    /// limit or leave the allowed domains.
    pub fn plan_children(&self, parent: &CrawlRequest, page: &PageNode) -> ChildPlan {
        let mut plan = ChildPlan::default();

        if !page.has_children() {
            return plan;
        }

        if !self.within_depth(parent.depth + 1) {
            plan.depth_filtered = page.child_links.len();
            tracing::debug!(
                "Depth limit {} reached at {}, not following {} links",
                self.max_depth,
                parent.url,
                plan.depth_filtered
            );
            return plan;
        }

        for link in &page.child_links {
            let url = match child_url(&self.base_url, &link.href) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Skipping link {:?} on {}: {}", link.href, parent.url, e);
                    plan.invalid += 1;
                    continue;
                }
            };

            if self.is_offsite(&url) {
                tracing::debug!("Filtered offsite request to {}", url);
                plan.offsite_filtered += 1;
                continue;
            }

            plan.requests.push(parent.child(url));
        }

        plan
    }
}
