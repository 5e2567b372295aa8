//! Generator module - writes the public directory

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::content::collection::{self, Neighbours};
use crate::content::loader::{self, LoadedContent};
use crate::content::{Document, FrontMatter, SourceFormat};
use crate::helpers::{
    absolutize_urls, date_xml, escape_xml, full_url_for, strip_invalid_xml_chars,
};
use crate::render::{PageLinks, PageRenderer};
use crate::templates::{PostSummary, Theme};
use crate::Site;

/// What a generation run produced
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub pages: usize,
    pub assets: usize,
    /// Source paths of documents that failed to render
    pub failed: Vec<String>,
}

/// Static site generator
pub struct Generator<'a> {
    site: &'a Site,
    renderer: PageRenderer,
    theme: Theme,
}

impl<'a> Generator<'a> {
    /// Create a new generator, loading layout overrides from the site
    pub fn new(site: &'a Site) -> Result<Self> {
        let theme = Theme::load(&site.layouts_dir)
            .with_context(|| format!("Failed to load layouts from {:?}", site.layouts_dir))?;
        Ok(Self::with_theme(site, theme))
    }

    /// Create a generator with an already loaded theme
    pub fn with_theme(site: &'a Site, theme: Theme) -> Self {
        Self {
            site,
            renderer: PageRenderer::new(&site.config),
            theme,
        }
    }

    /// Generate the entire site
    pub fn generate(&self, content: &LoadedContent) -> Result<GenerateReport> {
        let public_dir = &self.site.public_dir;
        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create {:?}", public_dir))?;

        let mut report = GenerateReport::default();

        let summaries: Vec<PostSummary> = content
            .posts
            .iter()
            .map(|p| self.renderer.summarize(p))
            .collect();

        let mut written: HashMap<PathBuf, &str> = HashMap::new();

        let posts = content.posts.iter().enumerate().map(|(i, post)| {
            (post, collection::neighbours(&content.posts, i))
        });
        let pages = content
            .pages
            .iter()
            .map(|page| (page, Neighbours::default()));

        for (doc, neighbours) in posts.chain(pages) {
            let links = PageLinks {
                neighbours,
                posts: &summaries,
            };
            let html = match self.renderer.render_with_links(doc, &self.theme, links) {
                Ok(html) => html,
                Err(e) => {
                    tracing::error!("Failed to render {}: {}", doc.source, e);
                    report.failed.push(doc.source.clone());
                    continue;
                }
            };

            let Some(dest) = output_path(public_dir, &doc.path) else {
                tracing::error!("{} has URL {} outside the public directory", doc.source, doc.path);
                report.failed.push(doc.source.clone());
                continue;
            };
            if let Some(previous) = written.insert(dest.clone(), &doc.source) {
                tracing::warn!(
                    "{} and {} both render to {}, keeping {}",
                    previous,
                    doc.source,
                    doc.path,
                    doc.source
                );
            }
            write_file(&dest, &html)?;
            tracing::debug!("Generated {:?}", dest);
            report.pages += 1;
        }

        report.assets = self.copy_source_assets()?;

        if self.site.config.feed.enable {
            self.generate_atom_feed(&content.posts)?;
        }

        Ok(report)
    }

    /// Copy non-document files from the source tree
    fn copy_source_assets(&self) -> Result<usize> {
        let source_dir = &self.site.source_dir;
        if !source_dir.exists() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(self.site.is_reserved(e.path())
                        || e.file_name()
                            .to_str()
                            .map(|n| n.starts_with('.') || n.starts_with('_'))
                            .unwrap_or(false))
            })
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || is_document(path)? {
                continue;
            }

            let relative = path.strip_prefix(source_dir)?;
            let dest = self.site.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest).with_context(|| format!("Failed to copy {:?}", path))?;
            copied += 1;
        }

        Ok(copied)
    }

    /// Generate Atom feed
    fn generate_atom_feed(&self, posts: &[Document]) -> Result<()> {
        let config = &self.site.config;
        let entries: Vec<&Document> = posts
            .iter()
            .filter(|p| p.date.is_some() || p.updated.is_some())
            .take(config.feed.limit)
            .collect();

        let Some(feed_updated) = entries.iter().filter_map(|p| p.updated.or(p.date)).max() else {
            tracing::debug!("No dated posts, skipping {}", config.feed.path);
            return Ok(());
        };

        let site_url = full_url_for(config, "/");
        let mut feed = String::new();
        feed.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        feed.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        if !config.description.is_empty() {
            feed.push_str(&format!(
                "  <subtitle>{}</subtitle>\n",
                escape_xml(&config.description)
            ));
        }
        feed.push_str(&format!(
            "  <link href=\"{}\" rel=\"self\"/>\n",
            full_url_for(config, &config.feed.path)
        ));
        feed.push_str(&format!("  <link href=\"{}\"/>\n", site_url));
        feed.push_str(&format!("  <updated>{}</updated>\n", date_xml(&feed_updated)));
        feed.push_str(&format!("  <id>{}</id>\n", site_url));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));

        for post in entries {
            let url = full_url_for(config, &post.path);
            let content = absolutize_urls(&self.renderer.body_html(post), &config.url);
            feed.push_str("  <entry>\n");
            feed.push_str(&format!(
                "    <title>{}</title>\n",
                escape_xml(&self.renderer.title(post))
            ));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", url));
            feed.push_str(&format!("    <id>{}</id>\n", url));
            if let Some(date) = &post.date {
                feed.push_str(&format!("    <published>{}</published>\n", date_xml(date)));
            }
            if let Some(updated) = post.updated.or(post.date) {
                feed.push_str(&format!("    <updated>{}</updated>\n", date_xml(&updated)));
            }
            feed.push_str(&format!(
                "    <summary>{}</summary>\n",
                escape_xml(&self.renderer.description(post))
            ));
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                strip_invalid_xml_chars(&content).replace("]]>", "]]]]><![CDATA[>")
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");

        let output_path = self.site.public_dir.join(&config.feed.path);
        write_file(&output_path, &feed)?;
        tracing::info!("Generated {}", config.feed.path);

        Ok(())
    }
}

/// The file a URL path is written to, or `None` if the path would land
/// outside `public_dir`
pub fn output_path(public_dir: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = Path::new(url_path.trim_start_matches('/'));
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    if url_path.ends_with(".html") {
        Some(public_dir.join(relative))
    } else {
        Some(public_dir.join(relative).join("index.html"))
    }
}

/// Markdown files, and HTML files that carry front-matter, are documents
fn is_document(path: &Path) -> Result<bool> {
    match loader::source_format(path) {
        Some(SourceFormat::Markdown) => Ok(true),
        Some(SourceFormat::Html) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            // Unparseable front-matter is still front-matter, not an asset
            Ok(!matches!(FrontMatter::parse(&text), Ok((None, _))))
        }
        None => Ok(false),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let public = Path::new("/site/public");
        assert_eq!(output_path(public, "/"), Some(public.join("index.html")));
        assert_eq!(
            output_path(public, "/blog/lisp/"),
            Some(public.join("blog/lisp/index.html"))
        );
        assert_eq!(
            output_path(public, "/404.html"),
            Some(public.join("404.html"))
        );
    }

    #[test]
    fn test_output_path_stays_in_public_dir() {
        let public = Path::new("/site/public");
        assert_eq!(output_path(public, "/../../escaped/"), None);
        assert_eq!(output_path(public, "/blog/../../x.html"), None);
        assert_eq!(output_path(public, "/./a/"), None);
    }
}
