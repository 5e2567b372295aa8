//! Document model

use chrono::DateTime;
use chrono_tz::Tz;
use indexmap::IndexMap;

use super::MarkdownRenderer;

/// Where a document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// A dated blog post from `_posts/`
    Post,
    /// Any other page (home, blog listing, about, ...)
    Page,
}

/// How the body is turned into HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Markdown,
    /// Emitted verbatim
    Html,
}

/// A content document: front-matter fields plus body
#[derive(Debug, Clone)]
pub struct Document {
    pub kind: DocumentKind,
    pub format: SourceFormat,

    /// Layout template name, without extension
    pub layout: String,

    pub title: Option<String>,
    pub date: Option<DateTime<Tz>>,
    pub updated: Option<DateTime<Tz>>,
    /// Explicit description from front-matter
    pub description: Option<String>,

    /// Raw body, front-matter removed
    pub body: String,

    /// Source path relative to the source directory
    pub source: String,
    pub slug: String,
    /// URL path with leading and trailing slash, without root
    pub path: String,

    pub published: bool,

    /// Custom front-matter fields
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Document {
    /// Create a page with the given body and everything else empty
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            kind: DocumentKind::Page,
            format: SourceFormat::Markdown,
            layout: "page".to_string(),
            title: None,
            date: None,
            updated: None,
            description: None,
            body: body.into(),
            source: String::new(),
            slug: String::new(),
            path: "/".to_string(),
            published: true,
            extra: IndexMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_dates(mut self, date: Option<DateTime<Tz>>, updated: Option<DateTime<Tz>>) -> Self {
        self.date = date;
        self.updated = updated;
        self
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    pub fn is_post(&self) -> bool {
        self.kind == DocumentKind::Post
    }

    /// Markdown source of the short summary: the body before the
    /// separator, or the first paragraph when there is none.
    /// HTML documents only have an excerpt when they use the separator.
    pub fn excerpt_source(&self, separator: &str) -> Option<&str> {
        let split = MarkdownRenderer::split_excerpt(&self.body, separator);
        match self.format {
            SourceFormat::Markdown => split.or_else(|| MarkdownRenderer::first_paragraph(&self.body)),
            SourceFormat::Html => split,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_source_uses_separator() {
        let doc = Document::new("Hello<!--more-->World");
        assert_eq!(doc.excerpt_source("<!--more-->"), Some("Hello"));
    }

    #[test]
    fn test_excerpt_source_falls_back_to_first_paragraph() {
        let doc = Document::new("Intro line.\n\nDetails.");
        assert_eq!(doc.excerpt_source("<!--more-->"), Some("Intro line."));

        let mut html = Document::new("<p>Intro</p>\n\n<p>More</p>");
        html.format = SourceFormat::Html;
        assert_eq!(html.excerpt_source("<!--more-->"), None);
    }

    #[test]
    fn test_builders() {
        let doc = Document::new("x").with_title("Hi").with_layout("home");
        assert_eq!(doc.title.as_deref(), Some("Hi"));
        assert_eq!(doc.layout, "home");
        assert!(!doc.is_post());
    }
}
