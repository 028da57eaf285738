//! termpress: a static blog generator with a retro terminal theme
//!
//! Posts are markdown files with YAML front-matter. They are loaded into a
//! [`content::PostRepository`], rendered with embedded Tera templates and
//! written to the public directory. Every page carries a short scripted
//! "boot" animation driven by [`boot::BootSequencer`].

pub mod boot;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

use content::PostRepository;

/// A site rooted at a directory containing `_config.yml`
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown sources
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Template overrides
    pub templates_dir: PathBuf,
}

impl Site {
    /// Open the site in `base_dir`; a missing `_config.yml` means defaults
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let templates_dir = base_dir.join(&config.templates_dir);

        Self {
            config,
            base_dir,
            source_dir,
            public_dir,
            templates_dir,
        }
    }

    /// Load and validate every post
    pub fn load_posts(&self) -> Result<PostRepository> {
        Ok(PostRepository::load(
            &self.source_dir,
            &self.config.load_options(),
        )?)
    }

    /// Generate the static site
    pub fn build(&self) -> Result<()> {
        commands::build::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str) -> Result<PathBuf> {
        commands::new::run(self, title)
    }
}
