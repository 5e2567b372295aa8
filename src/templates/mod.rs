//! Site theme using the Tera template engine
//!
//! The default theme is embedded in the binary. Any template found in the
//! site's layouts directory replaces the built-in template of the same name.
//! Autoescaping is off: text fields are escaped when the context is built,
//! so URLs and rendered content pass through untouched.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tera::{Context, Tera};
use walkdir::WalkDir;

use crate::helpers::strip_html;
use crate::render::RenderError;

/// The shell every layout extends
pub const SHELL: &str = "layout.html";

/// Layout used when a document names one the theme does not have
pub const FALLBACK_LAYOUT: &str = "page";

const BUILTIN: &[(&str, &str)] = &[
    ("layout.html", include_str!("default/layout.html")),
    ("home.html", include_str!("default/home.html")),
    ("blog.html", include_str!("default/blog.html")),
    ("post.html", include_str!("default/post.html")),
    ("page.html", include_str!("default/page.html")),
    (
        "partials/dates.html",
        include_str!("default/partials/dates.html"),
    ),
    (
        "partials/macros.html",
        include_str!("default/partials/macros.html"),
    ),
];

lazy_static! {
    /// Slots the shell must provide, with the pattern that finds each
    static ref REQUIRED_SLOTS: Vec<(&'static str, Regex)> = vec![
        ("page.title", Regex::new(r"\{\{-?\s*page\.title\b").expect("valid regex")),
        ("page.description", Regex::new(r"\{\{-?\s*page\.description\b").expect("valid regex")),
        ("main", Regex::new(r"\{%-?\s*block\s+main\s*-?%\}").expect("valid regex")),
    ];
}

/// Check that a shell template declares every required slot
pub fn validate_shell(name: &str, source: &str) -> Result<(), RenderError> {
    for (slot, pattern) in REQUIRED_SLOTS.iter() {
        if !pattern.is_match(source) {
            return Err(RenderError::MissingTemplateSlot {
                template: name.to_string(),
                slot: *slot,
            });
        }
    }
    Ok(())
}

/// A loaded, validated set of templates
pub struct Theme {
    tera: Tera,
    layouts: HashSet<String>,
}

impl Theme {
    /// The embedded default theme
    pub fn builtin() -> Result<Self, RenderError> {
        Self::from_templates(Vec::new())
    }

    /// The default theme with overrides from `layouts_dir`, if it exists
    pub fn load(layouts_dir: &Path) -> Result<Self, RenderError> {
        let mut overrides = Vec::new();

        if layouts_dir.is_dir() {
            for entry in WalkDir::new(layouts_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("html") {
                    continue;
                }
                let name = path
                    .strip_prefix(layouts_dir)
                    .unwrap_or(path)
                    .to_string_lossy()
                    .replace('\\', "/");
                let source = fs::read_to_string(path).map_err(|source| RenderError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::debug!("Using layout override {}", name);
                overrides.push((name, source));
            }
        }

        Self::from_templates(overrides)
    }

    /// Built-in templates plus the given `(name, source)` overrides
    pub fn from_templates(overrides: Vec<(String, String)>) -> Result<Self, RenderError> {
        let mut templates: BTreeMap<String, String> = BUILTIN
            .iter()
            .map(|(name, source)| (name.to_string(), source.to_string()))
            .collect();
        templates.extend(overrides);

        if let Some(shell) = templates.get(SHELL) {
            validate_shell(SHELL, shell)?;
        }

        let layouts = templates
            .keys()
            .filter(|name| !name.contains('/') && name.as_str() != SHELL)
            .filter_map(|name| name.strip_suffix(".html"))
            .map(str::to_string)
            .collect();

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(templates.iter().map(|(n, s)| (n.as_str(), s.as_str())))?;
        tera.register_filter("strip_html", strip_html_filter);

        Ok(Self { tera, layouts })
    }

    /// Whether a layout of this name exists
    pub fn has_layout(&self, layout: &str) -> bool {
        self.layouts.contains(layout)
    }

    /// Pick the template for a layout, falling back to the page layout
    pub fn resolve_layout<'a>(&self, layout: &'a str) -> &'a str {
        if self.has_layout(layout) {
            layout
        } else {
            tracing::warn!(
                "Layout {:?} does not exist, using {:?}",
                layout,
                FALLBACK_LAYOUT
            );
            FALLBACK_LAYOUT
        }
    }

    /// Render a layout with the given context
    pub fn render(&self, layout: &str, context: &Context) -> Result<String, RenderError> {
        let template = format!("{}.html", self.resolve_layout(layout));
        Ok(self.tera.render(&template, context)?)
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub home_url: String,
    pub blog_url: String,
    pub feed_url: Option<String>,
    pub menu: Vec<MenuItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    /// The document title, or the site title when it has none
    pub title: String,
    pub has_title: bool,
    pub layout: String,
    pub is_post: bool,
    pub url: String,
    pub permalink: String,
    pub date: Option<String>,
    pub date_iso: Option<String>,
    pub updated: Option<String>,
    pub updated_iso: Option<String>,
    pub description: String,
    pub source: String,
}

/// A post as it appears in listings
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub url: String,
    pub date: Option<String>,
    pub date_iso: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub title: String,
    pub url: String,
}

/// Everything a layout can see
#[derive(Debug, Clone, Serialize)]
pub struct PageContext<'a> {
    pub site: &'a SiteData,
    pub page: PageData,
    pub content: String,
    pub prev: Option<NavLink>,
    pub next: Option<NavLink>,
    pub posts: &'a [PostSummary],
    pub recent_posts: &'a [PostSummary],
}
