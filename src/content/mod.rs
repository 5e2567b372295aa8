//! Content module - handles documents, front-matter, and markdown

pub mod collection;
mod document;
mod frontmatter;
pub mod loader;
mod markdown;

pub use document::{Document, DocumentKind, SourceFormat};
pub use frontmatter::{parse_date_string, FrontMatter, FrontMatterError};
pub use markdown::MarkdownRenderer;
