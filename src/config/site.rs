//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::boot::BootScript;
use crate::content::{LoadOptions, LoadPolicy};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub date_format: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,
    pub templates_dir: String,
    pub post_dir: String,
    pub tag_dir: String,

    // Content
    pub extensions: Vec<String>,
    pub on_error: LoadPolicy,

    // Output
    pub feed_limit: usize,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Boot animation
    #[serde(default)]
    pub boot: BootScript,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "termpress".to_string(),
            description: String::new(),
            author: "John Doe".to_string(),
            language: "en".to_string(),
            date_format: "YYYY-MM-DD".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            source_dir: "posts".to_string(),
            public_dir: "public".to_string(),
            templates_dir: "templates".to_string(),
            post_dir: "posts".to_string(),
            tag_dir: "tags".to_string(),

            extensions: vec!["md".to_string(), "markdown".to_string()],
            on_error: LoadPolicy::default(),

            feed_limit: 20,
            highlight: HighlightConfig::default(),

            boot: BootScript::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        if !config.extra.is_empty() {
            let mut keys: Vec<_> = config.extra.keys().collect();
            keys.sort();
            tracing::debug!("Ignoring unknown config keys: {:?}", keys);
        }
        Ok(config)
    }

    /// Options handed to the post repository
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            extensions: self.extensions.clone(),
            policy: self.on_error,
            highlight: self.highlight.clone(),
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// syntect theme name
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::Delay;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.source_dir, "posts");
        assert_eq!(config.on_error, LoadPolicy::FailFast);
        assert_eq!(config.feed_limit, 20);
        assert!(!config.boot.lines.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
author: Test User
on_error: skip
extensions: [md]
highlight:
  theme: InspiredGitHub
boot:
  delay:
    min_ms: 10
    max_ms: 40
  lines:
    - text: "BIOS v1.0"
    - text: "loading kernel"
      delay_ms: 5
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.author, "Test User");
        assert_eq!(config.on_error, LoadPolicy::SkipInvalid);
        assert_eq!(config.extensions, vec!["md"]);
        assert_eq!(config.highlight.theme, "InspiredGitHub");
        assert_eq!(config.boot.lines.len(), 2);
        assert_eq!(config.boot.lines[1].delay_ms, Some(5));
        assert_eq!(
            config.boot.delay,
            Delay::Random {
                min_ms: 10,
                max_ms: 40
            }
        );
        // Untouched sections keep their defaults
        assert_eq!(config.public_dir, "public");
    }
}
