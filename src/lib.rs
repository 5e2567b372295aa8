//! quire: a small static site generator for a personal website
//!
//! A site is a directory with a `_config.yml`, a source tree of markdown
//! (and front-matter HTML) documents, dated posts under `_posts/`, and
//! optional layout overrides. Every document is rendered through a shared
//! Tera shell into one HTML file under the public directory.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod render;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Name of the site configuration file
pub const CONFIG_FILE: &str = "_config.yml";

/// Directory of front-matter templates for `quire new`
pub const SCAFFOLDS_DIR: &str = "scaffolds";

/// A site on disk
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Layout override directory
    pub layouts_dir: PathBuf,
}

impl Site {
    /// Open a site directory. A missing `_config.yml` means all defaults.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No {} in {:?}, using defaults", CONFIG_FILE, base_dir);
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let layouts_dir = base_dir.join(&config.layouts_dir);

        Self {
            config,
            base_dir,
            source_dir,
            public_dir,
            layouts_dir,
        }
    }

    /// Whether a path is the output, a layout override or a scaffold. These
    /// can sit inside the source tree (`source_dir: .`) but are never content.
    pub fn is_reserved(&self, path: &Path) -> bool {
        path.starts_with(&self.public_dir)
            || path.starts_with(&self.layouts_dir)
            || path.starts_with(self.base_dir.join(SCAFFOLDS_DIR))
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post or page
    pub fn new_document(&self, title: &str, layout: &str) -> Result<PathBuf> {
        commands::new::create(self, title, layout, chrono::Local::now().date_naive())
    }
}
