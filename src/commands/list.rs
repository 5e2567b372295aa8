//! List site content

use anyhow::Result;

use crate::content::loader::ContentLoader;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let content = ContentLoader::new(site)?.load()?;

    match content_type {
        "post" | "posts" => {
            println!("Posts ({}):", content.posts.len());
            for post in &content.posts {
                let date = post
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".to_string());
                println!(
                    "  {} - {} [{}] {}",
                    date,
                    post.title.as_deref().unwrap_or("(untitled)"),
                    post.source,
                    post.path
                );
            }
        }
        "page" | "pages" => {
            println!("Pages ({}):", content.pages.len());
            for page in &content.pages {
                println!(
                    "  {} [{}] {} ({})",
                    page.title.as_deref().unwrap_or("(untitled)"),
                    page.source,
                    page.path,
                    page.layout
                );
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, page", content_type);
        }
    }

    if !content.failed.is_empty() {
        println!("Failed to load ({}):", content.failed.len());
        for path in &content.failed {
            println!("  {}", path.display());
        }
    }

    Ok(())
}
