//! Robots.txt rule evaluation using the robotstxt crate

use robotstxt::DefaultMatcher;

/// Robots.txt rules for one host
///
/// This is a thin wrapper around the robotstxt crate's matcher; the raw text is kept
/// and parsed on demand for each check.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Equivalent to an empty robots.txt.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL (or path) to check
    /// * `user_agent` - The product token matched against `User-agent` groups
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}
