//! Engine Configuration
//!
//! Plain options struct shared by the index, renderer and decorator.
//! Every field has a default so callers only override what they need.

use std::collections::HashSet;

/// Elements whose text content is never rendered
pub const DEFAULT_HIDDEN_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "title", "audio", "video", "canvas", "object",
    "iframe",
];

/// Highlighter configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Element names whose text children are masked with spaces in the index
    pub hidden_tags: HashSet<String>,
    /// Element name used for wrappers
    pub wrapper_tag: String,
    /// Attribute that marks an element as a synthetic wrapper (value: highlight id)
    pub marker_attribute: String,
    /// Attribute carrying the owning query name
    pub query_attribute: String,
    /// Class applied to every wrapper
    pub class_name: String,
    /// Extra class applied to the wrappers of the active highlight
    pub active_class: String,
    /// Compiled patterns kept in the LRU cache
    pub pattern_cache_size: usize,
    /// Verify marker contiguity after every index mutation
    pub consistency_checks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hidden_tags: DEFAULT_HIDDEN_TAGS.iter().map(|t| t.to_string()).collect(),
            wrapper_tag: "mark".to_string(),
            marker_attribute: "data-highlight".to_string(),
            query_attribute: "data-query".to_string(),
            class_name: "highlight".to_string(),
            active_class: "highlight-active".to_string(),
            pattern_cache_size: 64,
            consistency_checks: cfg!(any(debug_assertions, feature = "consistency_checks")),
        }
    }
}

impl Config {
    /// Replace the hidden tag set
    pub fn with_hidden_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden_tags = tags
            .into_iter()
            .map(|t| t.into().to_ascii_lowercase())
            .collect();
        self
    }

    /// Set the wrapper element name
    pub fn with_wrapper_tag(mut self, tag: impl Into<String>) -> Self {
        self.wrapper_tag = tag.into();
        self
    }

    /// Enable or disable consistency checks
    pub fn with_consistency_checks(mut self, enabled: bool) -> Self {
        self.consistency_checks = enabled;
        self
    }

    /// Check whether an element name is in the hidden set (ASCII case-insensitive)
    pub fn is_hidden_tag(&self, name: &str) -> bool {
        contains_tag(&self.hidden_tags, name)
    }
}

/// Look up an element name in a lowercase tag set
pub(crate) fn contains_tag(tags: &HashSet<String>, name: &str) -> bool {
    if tags.contains(name) {
        return true;
    }
    name.bytes().any(|b| b.is_ascii_uppercase()) && tags.contains(&name.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.is_hidden_tag("script"));
        assert!(config.is_hidden_tag("STYLE"));
        assert!(!config.is_hidden_tag("p"));
        assert_eq!(config.wrapper_tag, "mark");
    }

    #[test]
    fn test_custom_hidden_tags() {
        let config = Config::default().with_hidden_tags(["Aside"]);
        assert!(config.is_hidden_tag("aside"));
        assert!(config.is_hidden_tag("ASIDE"));
        assert!(!config.is_hidden_tag("script"));
    }
}
