//! Create a new post or page

use anyhow::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use crate::content::loader::POSTS_DIR;
use crate::{Site, SCAFFOLDS_DIR};

/// Create a new document and return its path.
///
/// Posts go to `_posts/<date>-<slug>.md`; any other layout becomes a page at
/// `<slug>/index.md`. A `scaffolds/<layout>.md` file in the site overrides
/// the default front-matter, with `{{ title }}`, `{{ date }}` and
/// `{{ layout }}` substituted.
pub fn create(site: &Site, title: &str, layout: &str, today: NaiveDate) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title {:?}", title);
    }

    let file_path = if layout == "post" {
        site.source_dir
            .join(POSTS_DIR)
            .join(format!("{}-{}.md", today.format("%Y-%m-%d"), slug))
    } else {
        site.source_dir.join(&slug).join("index.md")
    };

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let scaffold_path = site.base_dir.join(SCAFFOLDS_DIR).join(format!("{}.md", layout));
    let scaffold = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
    } else {
        "---\nlayout: {{ layout }}\ntitle: {{ title }}\ndate: {{ date }}\n---\n\n".to_string()
    };

    let content = scaffold
        .replace("{{ layout }}", layout)
        .replace("{{ title }}", &yaml_string(title))
        .replace("{{ date }}", &today.format("%Y-%m-%d").to_string());

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;

    tracing::info!("Created {:?}", file_path);
    Ok(file_path)
}

/// Double-quoted YAML scalar
fn yaml_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
