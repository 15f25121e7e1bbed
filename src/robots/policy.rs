//! robots.txt policy for the crawled site
//!
//! Matching is delegated to the robotstxt crate; the crawl delay directive,
//! which that crate does not expose, is read from the agent's group here.

use robotstxt::DefaultMatcher;
use url::Url;

/// The robots.txt rules of the crawled site
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    /// Raw robots.txt body; `None` allows everything
    content: Option<String>,
}

impl RobotsPolicy {
    /// Creates a policy from a robots.txt body
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// A policy that allows every URL
    ///
    /// Used when obeying robots.txt is switched off or the file is missing.
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    /// Returns true if no rules were loaded
    pub fn is_allow_all(&self) -> bool {
        self.content.as_deref().map_or(true, str::is_empty)
    }

    /// Checks if `user_agent` may fetch `url`
    pub fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        match self.content.as_deref() {
            None | Some("") => true,
            Some(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url.as_str())
            }
        }
    }

    /// Crawl delay requested for `user_agent`, in seconds
    ///
    /// A group naming the agent takes precedence over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let content = self.content.as_deref()?;
        let agent = user_agent.to_lowercase();

        let mut group_agents: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut agent_delay = None;
        let mut wildcard_delay = None;

        for line in content.lines() {
            // Strip comments
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules opens a new group
                    if in_rules {
                        group_agents.clear();
                        in_rules = false;
                    }
                    group_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group_agents.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        agent_delay = Some(delay);
                    } else if group_agents.iter().any(|ua| ua == "*") {
                        wildcard_delay = Some(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        agent_delay.or(wildcard_delay)
    }
}
