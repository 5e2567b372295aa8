//! Content loader - loads posts and pages from the source directory

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::collection;
use super::{Document, DocumentKind, FrontMatter, FrontMatterError, SourceFormat};
use crate::config::SiteConfig;
use crate::Site;

/// Directory under the source dir that holds posts
pub const POSTS_DIR: &str = "_posts";

lazy_static! {
    /// `2021-03-14-some-slug`
    static ref DATED_FILENAME: Regex =
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(.+)$").expect("valid regex");
}

/// Everything found under the source directory
#[derive(Debug, Default)]
pub struct LoadedContent {
    /// Newest first, undated last
    pub posts: Vec<Document>,
    pub pages: Vec<Document>,
    /// Files that looked like documents but could not be read
    pub failed: Vec<PathBuf>,
}

/// Loads content from the source directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    tz: Tz,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Result<Self> {
        let tz = site.config.tz()?;
        Ok(Self { site, tz })
    }

    /// Load all posts and pages
    pub fn load(&self) -> Result<LoadedContent> {
        let mut content = LoadedContent::default();
        let source_dir = &self.site.source_dir;
        if !source_dir.exists() {
            tracing::warn!("Source directory {:?} does not exist", source_dir);
            return Ok(content);
        }

        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !(is_hidden(e.path()) || self.site.is_reserved(e.path()))
            })
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(source_dir)?;
            let Some(kind) = classify(relative) else {
                continue;
            };
            let Some(format) = source_format(path) else {
                continue;
            };

            match self.load_document(path, relative, kind, format) {
                Ok(Some(doc)) if doc.published || self.site.config.render_drafts => match kind {
                    DocumentKind::Post => content.posts.push(doc),
                    DocumentKind::Page => content.pages.push(doc),
                },
                Ok(Some(doc)) => tracing::debug!("Skipping unpublished {}", doc.source),
                // HTML without front-matter is a static asset
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("Failed to load {:?}: {:#}", relative, e);
                    content.failed.push(relative.to_path_buf());
                }
            }
        }

        collection::sort_posts(&mut content.posts);

        Ok(content)
    }

    fn load_document(
        &self,
        path: &Path,
        relative: &Path,
        kind: DocumentKind,
        format: SourceFormat,
    ) -> Result<Option<Document>> {
        let text =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let doc = parse_document(&text, relative, kind, format, &self.site.config, self.tz)?;
        Ok(doc)
    }
}

/// Whether a file in the source tree is a post, a page, or neither
pub fn classify(relative: &Path) -> Option<DocumentKind> {
    let first = relative.components().next()?.as_os_str().to_str()?;
    if first == POSTS_DIR {
        Some(DocumentKind::Post)
    } else if first.starts_with('_') {
        None
    } else {
        Some(DocumentKind::Page)
    }
}

/// The document format implied by a file's extension
pub fn source_format(path: &Path) -> Option<SourceFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("md") | Some("markdown") => Some(SourceFormat::Markdown),
        Some("html") | Some("htm") => Some(SourceFormat::Html),
        _ => None,
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Build a document from file text. Returns `None` for HTML files without
/// front-matter, which are copied as-is instead.
pub fn parse_document(
    text: &str,
    relative: &Path,
    kind: DocumentKind,
    format: SourceFormat,
    config: &SiteConfig,
    tz: Tz,
) -> Result<Option<Document>, FrontMatterError> {
    let (fm, body) = FrontMatter::parse(text)?;
    let fm = match (fm, format) {
        (Some(fm), _) => fm,
        (None, SourceFormat::Markdown) => FrontMatter::default(),
        (None, SourceFormat::Html) => return Ok(None),
    };

    let stem = relative
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled");

    let (filename_date, slug) = match kind {
        DocumentKind::Post => split_dated_filename(stem, tz),
        DocumentKind::Page => (None, page_slug(relative)),
    };

    let date = fm.parse_date(tz)?.or(filename_date);
    let updated = fm.parse_updated(tz)?;

    let layout = fm.layout.clone().unwrap_or_else(|| match kind {
        DocumentKind::Post => "post".to_string(),
        DocumentKind::Page => "page".to_string(),
    });

    let path = match (&fm.permalink, kind) {
        (Some(permalink), _) => normalize_url_path(permalink),
        (None, DocumentKind::Post) => post_path(&config.permalink, date.as_ref(), &slug),
        (None, DocumentKind::Page) => page_path(relative),
    };

    Ok(Some(Document {
        kind,
        format,
        layout,
        title: fm.title.filter(|t| !t.trim().is_empty()),
        date,
        updated,
        description: fm.description.filter(|d| !d.trim().is_empty()),
        body: body.to_string(),
        source: relative.to_string_lossy().replace('\\', "/"),
        slug,
        path,
        published: fm.published,
        extra: fm.extra,
    }))
}

/// Split `2021-03-14-slug` into its date and slug
fn split_dated_filename(stem: &str, tz: Tz) -> (Option<chrono::DateTime<Tz>>, String) {
    let Some(caps) = DATED_FILENAME.captures(stem) else {
        return (None, stem.to_string());
    };
    let date = NaiveDate::from_ymd_opt(
        caps[1].parse().unwrap_or(0),
        caps[2].parse().unwrap_or(0),
        caps[3].parse().unwrap_or(0),
    )
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .and_then(|dt| tz.from_local_datetime(&dt).earliest());

    match date {
        Some(date) => (Some(date), caps[4].to_string()),
        None => (None, stem.to_string()),
    }
}

fn page_slug(relative: &Path) -> String {
    let stem = relative.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    if stem == "index" {
        relative
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("index")
            .to_string()
    } else {
        stem.to_string()
    }
}

/// `index.md` -> `/`, `about.md` -> `/about/`, `blog/index.md` -> `/blog/`
pub fn page_path(relative: &Path) -> String {
    let without_ext = relative.with_extension("");
    let mut parts: Vec<String> = without_ext
        .components()
        .filter_map(|c| c.as_os_str().to_str().map(str::to_string))
        .collect();
    if parts.last().map(String::as_str) == Some("index") {
        parts.pop();
    }
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", parts.join("/"))
    }
}

/// Expand a permalink pattern for a post
pub fn post_path(pattern: &str, date: Option<&chrono::DateTime<Tz>>, slug: &str) -> String {
    let (year, month, day) = match date {
        Some(d) => (
            d.format("%Y").to_string(),
            d.format("%m").to_string(),
            d.format("%d").to_string(),
        ),
        None => Default::default(),
    };

    let expanded = pattern
        .replace(":year", &year)
        .replace(":month", &month)
        .replace(":day", &day)
        .replace(":slug", slug)
        .replace(":title", slug);

    normalize_url_path(&expanded)
}

/// Collapse empty, `.` and `..` segments and add the leading slash, plus a
/// trailing slash unless the path names a file. The result never climbs
/// above the site root.
pub fn normalize_url_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    let joined = format!("/{}", segments.join("/"));
    if joined.ends_with(".html") {
        joined
    } else {
        format!("{}/", joined)
    }
}
