//! Page rendering: front-matter and body substituted into the theme shell
//!
//! Rendering is a pure function of the document, the links resolved for it
//! and the theme. Nothing here reads the clock or the filesystem, so the
//! same inputs always give byte-identical HTML.

use std::path::PathBuf;

use tera::Context;

use crate::config::SiteConfig;
use crate::content::collection::Neighbours;
use crate::content::{Document, MarkdownRenderer, SourceFormat};
use crate::helpers::{date_xml, format_date, full_url_for, html_escape, strip_html, url_for};
use crate::templates::{MenuItem, NavLink, PageContext, PageData, PostSummary, SiteData, Theme};

/// Errors that stop a page from being rendered
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template {template:?} is missing required slot `{slot}`")]
    MissingTemplateSlot {
        template: String,
        slot: &'static str,
    },

    #[error("template error: {}", tera_chain(.0))]
    Template(#[from] tera::Error),

    #[error("failed to read template {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tera puts the useful part of its messages in the source chain
fn tera_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Collection-level data a page may link to
#[derive(Debug, Clone, Copy, Default)]
pub struct PageLinks<'a> {
    pub neighbours: Neighbours<'a>,
    /// All posts, newest first
    pub posts: &'a [PostSummary],
}

/// Renders documents through a theme
pub struct PageRenderer {
    config: SiteConfig,
    markdown: MarkdownRenderer,
    site: SiteData,
}

impl PageRenderer {
    /// Create a renderer for a site
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            markdown: MarkdownRenderer::with_options(&config.highlight),
            site: build_site_data(config),
            config: config.clone(),
        }
    }

    /// Render a document on its own, with no navigation or listings
    pub fn render(&self, doc: &Document, theme: &Theme) -> Result<String, RenderError> {
        self.render_with_links(doc, theme, PageLinks::default())
    }

    /// Render a document with its resolved neighbours and the post listing
    pub fn render_with_links(
        &self,
        doc: &Document,
        theme: &Theme,
        links: PageLinks<'_>,
    ) -> Result<String, RenderError> {
        let recent = links.posts.len().min(self.config.home_posts);
        let context = PageContext {
            site: &self.site,
            page: self.page_data(doc),
            content: self.body_html(doc),
            prev: links.neighbours.prev.map(|p| self.nav_link(p)),
            next: links.neighbours.next.map(|p| self.nav_link(p)),
            posts: links.posts,
            recent_posts: &links.posts[..recent],
        };

        let context = Context::from_serialize(&context)?;
        theme.render(&doc.layout, &context)
    }

    /// The full body as HTML. The excerpt separator stays in place as a
    /// comment.
    pub fn body_html(&self, doc: &Document) -> String {
        match doc.format {
            SourceFormat::Markdown => self.markdown.render(&doc.body),
            SourceFormat::Html => doc.body.clone(),
        }
    }

    /// Plain-text short description: the front-matter description, else the
    /// body before the separator (or its first paragraph) with markup
    /// stripped, else the site description.
    pub fn description(&self, doc: &Document) -> String {
        if let Some(description) = &doc.description {
            return strip_html(description);
        }

        let excerpt = doc
            .excerpt_source(&self.config.excerpt_separator)
            .map(|source| match doc.format {
                SourceFormat::Markdown => strip_html(&self.markdown.render(source)),
                SourceFormat::Html => strip_html(source),
            })
            .filter(|text| !text.is_empty());

        excerpt.unwrap_or_else(|| self.config.description.clone())
    }

    /// The title to show, falling back to the site title
    pub fn title(&self, doc: &Document) -> String {
        doc.title
            .clone()
            .unwrap_or_else(|| self.config.title.clone())
    }

    /// A post as it appears in the blog listing
    pub fn summarize(&self, doc: &Document) -> PostSummary {
        PostSummary {
            title: html_escape(&self.title(doc)),
            url: url_for(&self.config, &doc.path),
            date: doc.date.as_ref().map(|d| format_date(d, &self.config.date_format)),
            date_iso: doc.date.as_ref().map(date_xml),
            description: html_escape(&self.description(doc)),
        }
    }

    fn page_data(&self, doc: &Document) -> PageData {
        PageData {
            title: html_escape(&self.title(doc)),
            has_title: doc.title.is_some(),
            layout: doc.layout.clone(),
            is_post: doc.is_post(),
            url: url_for(&self.config, &doc.path),
            permalink: full_url_for(&self.config, &doc.path),
            date: doc.date.as_ref().map(|d| format_date(d, &self.config.date_format)),
            date_iso: doc.date.as_ref().map(date_xml),
            updated: doc
                .updated
                .as_ref()
                .map(|d| format_date(d, &self.config.date_format)),
            updated_iso: doc.updated.as_ref().map(date_xml),
            description: html_escape(&self.description(doc)),
            source: doc.source.clone(),
        }
    }

    fn nav_link(&self, doc: &Document) -> NavLink {
        NavLink {
            title: html_escape(&self.title(doc)),
            url: url_for(&self.config, &doc.path),
        }
    }
}

fn build_site_data(config: &SiteConfig) -> SiteData {
    SiteData {
        title: html_escape(&config.title),
        description: html_escape(&config.description),
        author: html_escape(&config.author),
        language: config.language.clone(),
        url: config.url.clone(),
        home_url: url_for(config, "/"),
        blog_url: url_for(config, "/blog/"),
        feed_url: config
            .feed
            .enable
            .then(|| url_for(config, &config.feed.path)),
        menu: config
            .menu
            .iter()
            .map(|(name, path)| MenuItem {
                name: html_escape(name),
                url: url_for(config, path),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::parse_date_string;
    use chrono_tz::Tz;

    fn renderer() -> PageRenderer {
        let mut config = SiteConfig::default();
        config.title = "Jane Doe".to_string();
        config.description = "Notes and essays".to_string();
        PageRenderer::new(&config)
    }

    fn date(s: &str) -> Option<chrono::DateTime<Tz>> {
        parse_date_string(s, Tz::UTC)
    }

    fn post(body: &str) -> Document {
        let mut doc = Document::new(body).with_layout("post");
        doc.kind = crate::content::DocumentKind::Post;
        doc.path = "/blog/post/".to_string();
        doc
    }

    #[test]
    fn test_example_document() {
        let renderer = renderer();
        let theme = Theme::builtin().unwrap();
        let doc = Document::new("Hello<!--more-->World").with_title("Hi");

        assert_eq!(renderer.description(&doc), "Hello");

        let html = renderer.render(&doc, &theme).unwrap();
        assert!(html.contains("<p>Hello<!--more-->World</p>"));
        assert!(html.contains(r#"<meta name="description" content="Hello">"#));
        assert!(html.contains("<title>Hi | Jane Doe</title>"));
        assert!(!html.contains(r#"class="post-date""#));
        assert!(!html.contains(r#"class="post-updated""#));
    }

    #[test]
    fn test_missing_updated_omits_line() {
        let renderer = renderer();
        let theme = Theme::builtin().unwrap();
        let doc = post("Body").with_title("Dated").with_dates(date("2021-03-14"), None);

        let html = renderer.render(&doc, &theme).unwrap();
        assert!(html.contains(r#"<p class="post-date"><time datetime="2021-03-14T00:00:00+00:00">March 14, 2021</time></p>"#));
        assert!(!html.contains(r#"class="post-updated""#));
    }

    #[test]
    fn test_date_before_updated() {
        let renderer = renderer();
        let theme = Theme::builtin().unwrap();
        for layout in ["post", "page"] {
            let doc = post("Body")
                .with_layout(layout)
                .with_title("Both")
                .with_dates(date("2021-03-14"), date("2022-01-02"));

            let html = renderer.render(&doc, &theme).unwrap();
            let date_at = html.find(r#"class="post-date""#).unwrap();
            let updated_at = html.find(r#"class="post-updated""#).unwrap();
            assert!(date_at < updated_at, "{} layout", layout);
            assert!(html.contains("Updated <time datetime=\"2022-01-02T00:00:00+00:00\">January 2, 2022</time>"));
        }
    }

    #[test]
    fn test_untitled_falls_back_to_site_title() {
        let renderer = renderer();
        let theme = Theme::builtin().unwrap();
        let doc = post("Body");

        let html = renderer.render(&doc, &theme).unwrap();
        assert!(html.contains("<title>Jane Doe</title>"));
        assert!(html.contains("<h1>Jane Doe</h1>"));
    }

    #[test]
    fn test_description_strips_markup() {
        let renderer = renderer();
        let doc = Document::new("A *tiny* [Lisp](https://lisp.org) & more\n<!--more-->\nRest");
        assert_eq!(renderer.description(&doc), "A tiny Lisp & more");

        // Escaped once for the attribute
        let theme = Theme::builtin().unwrap();
        let html = renderer.render(&doc, &theme).unwrap();
        assert!(html.contains(r#"content="A tiny Lisp &amp; more""#));
    }

    #[test]
    fn test_description_precedence() {
        let renderer = renderer();

        let mut doc = Document::new("Summary<!--more-->Rest");
        doc.description = Some("Explicit".to_string());
        assert_eq!(renderer.description(&doc), "Explicit");

        let doc = Document::new("# Heading\n\nFirst paragraph.\n\nSecond.");
        assert_eq!(renderer.description(&doc), "First paragraph.");

        let doc = Document::new("");
        assert_eq!(renderer.description(&doc), "Notes and essays");
    }

    #[test]
    fn test_description_from_crlf_body() {
        let renderer = renderer();
        let doc = Document::new("Intro line.\r\n\r\nSecond paragraph that is long.\r\n");
        assert_eq!(renderer.description(&doc), "Intro line.");
    }

    #[test]
    fn test_html_body_is_verbatim() {
        let renderer = renderer();
        let mut doc = Document::new("<section>*not markdown*</section>");
        doc.format = SourceFormat::Html;
        assert_eq!(renderer.body_html(&doc), "<section>*not markdown*</section>");
    }

    #[test]
    fn test_prev_next_only_when_resolved() {
        let renderer = renderer();
        let theme = Theme::builtin().unwrap();
        let mut older = post("Old").with_title("Older post");
        older.path = "/blog/older/".to_string();
        let doc = post("Body").with_title("Current");

        let html = renderer.render(&doc, &theme).unwrap();
        assert!(!html.contains(r#"class="post-nav""#));

        let links = PageLinks {
            neighbours: Neighbours {
                prev: Some(&older),
                next: None,
            },
            posts: &[],
        };
        let html = renderer.render_with_links(&doc, &theme, links).unwrap();
        assert!(html.contains(r#"<a class="prev" rel="prev" href="/blog/older/">&larr; Older post</a>"#));
        assert!(!html.contains(r#"class="next""#));
    }

    #[test]
    fn test_blog_and_home_listings() {
        let renderer = renderer();
        let theme = Theme::builtin().unwrap();
        let posts: Vec<Document> = (1..=7)
            .map(|i| {
                let mut p = post(&format!("Summary {}<!--more-->Rest", i))
                    .with_title(format!("Post {}", i))
                    .with_dates(date(&format!("2021-01-0{}", i)), None);
                p.path = format!("/blog/p{}/", i);
                p
            })
            .collect();
        let summaries: Vec<PostSummary> = posts.iter().map(|p| renderer.summarize(p)).collect();
        let links = PageLinks {
            neighbours: Neighbours::default(),
            posts: &summaries,
        };

        let blog = Document::new("All my writing.").with_title("Blog").with_layout("blog");
        let html = renderer.render_with_links(&blog, &theme, links).unwrap();
        assert_eq!(html.matches(r#"<li>"#).count(), 7);
        assert!(html.contains(r#"<p class="meta">Summary 3</p>"#));

        let home = Document::new("Welcome.").with_layout("home");
        let html = renderer.render_with_links(&home, &theme, links).unwrap();
        // home_posts defaults to 5
        assert_eq!(html.matches(r#"<li>"#).count(), 5);
        assert!(html.contains(r#"href="/blog/p5/""#));
        assert!(!html.contains(r#"href="/blog/p6/""#));
    }

    #[test]
    fn test_unknown_layout_falls_back_to_page() {
        let renderer = renderer();
        let theme = Theme::builtin().unwrap();
        let doc = Document::new("Body").with_title("T").with_layout("gallery");
        let html = renderer.render(&doc, &theme).unwrap();
        assert!(html.contains(r#"<article class="page">"#));
    }

    #[test]
    fn test_undefined_variable_is_template_error() {
        let renderer = renderer();
        let broken = r#"{% extends "layout.html" %}{% block main %}{{ page.nope.deeper }}{% endblock main %}"#;
        let theme = Theme::from_templates(vec![("broken.html".into(), broken.into())]).unwrap();
        let doc = Document::new("Body").with_layout("broken");
        let err = renderer.render(&doc, &theme).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let renderer = renderer();
        let theme = Theme::builtin().unwrap();
        let doc = post("```lisp\n(car xs)\n```\n\nText<!--more-->More")
            .with_title("Same")
            .with_dates(date("2021-03-14 09:00"), date("2021-03-15"));

        let first = renderer.render(&doc, &theme).unwrap();
        let second = renderer.render(&doc, &theme).unwrap();
        assert_eq!(first, second);
    }
}
