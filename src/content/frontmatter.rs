//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Errors raised while reading a document's front-matter
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("invalid YAML front-matter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("invalid JSON front-matter: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unclosed JSON front-matter - missing closing ;;;")]
    UnclosedJson,

    #[error("invalid {field} {value:?}: expected YYYY-MM-DD[ HH:MM[:SS]] or RFC 3339")]
    InvalidDate { field: &'static str, value: String },
}

/// Front-matter data from a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub layout: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub updated: Option<String>,
    pub description: Option<String>,
    pub permalink: Option<String>,
    pub published: bool,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            layout: None,
            title: None,
            date: None,
            updated: None,
            description: None,
            permalink: None,
            published: true,
            extra: IndexMap::new(),
        }
    }
}

impl FrontMatter {
    /// Parse front-matter from content string.
    /// Returns `None` for the front-matter when the content has no block.
    pub fn parse(content: &str) -> Result<(Option<Self>, &str), FrontMatterError> {
        let trimmed = content.trim_start();

        if trimmed.starts_with("---") {
            return Self::parse_yaml(content, trimmed);
        }

        if let Some(rest) = trimmed.strip_prefix(";;;") {
            return Self::parse_json(rest);
        }

        Ok((None, content))
    }

    fn parse_yaml<'a>(
        original: &'a str,
        content: &'a str,
    ) -> Result<(Option<Self>, &'a str), FrontMatterError> {
        let rest = content[3..].trim_start_matches(['\n', '\r']);

        // Empty block: "---\n---"
        if let Some(remaining) = rest.strip_prefix("---") {
            return Ok((Some(Self::default()), remaining.trim_start_matches(['\n', '\r'])));
        }

        let Some(end_pos) = rest.find("\n---") else {
            // No closing fence, so this is a horizontal rule
            return Ok((None, original));
        };

        let yaml_content = &rest[..end_pos];
        let remaining = rest[end_pos + 4..].trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return Ok((Some(Self::default()), remaining));
        }

        // Markdown that happens to be fenced by thematic breaks is body text
        if !looks_like_yaml(yaml_content) {
            return Ok((None, original));
        }

        let fm: FrontMatter = serde_yaml::from_str(yaml_content)?;
        Ok((Some(fm), remaining))
    }

    fn parse_json(rest: &str) -> Result<(Option<Self>, &str), FrontMatterError> {
        let end_pos = rest.find(";;;").ok_or(FrontMatterError::UnclosedJson)?;
        let json_content = rest[..end_pos].trim();
        let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);

        // Allow both `;;; "title": "x" ;;;` and `;;; {"title": "x"} ;;;`
        let fm: FrontMatter = if json_content.starts_with('{') {
            serde_json::from_str(json_content)?
        } else {
            serde_json::from_str(&format!("{{{}}}", json_content))?
        };

        Ok((Some(fm), remaining))
    }

    /// Parse the date field in the given timezone
    pub fn parse_date(&self, tz: Tz) -> Result<Option<DateTime<Tz>>, FrontMatterError> {
        parse_optional("date", self.date.as_deref(), tz)
    }

    /// Parse the updated field in the given timezone
    pub fn parse_updated(&self, tz: Tz) -> Result<Option<DateTime<Tz>>, FrontMatterError> {
        parse_optional("updated", self.updated.as_deref(), tz)
    }
}

/// True when at least one line has a `key: value` or `key:` shape
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };
        let key = &trimmed[..colon_pos];
        let is_valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp" | "mailto");
        let after = &trimmed[colon_pos + 1..];
        is_valid_key && (after.is_empty() || after.starts_with(' '))
    })
}

fn parse_optional(
    field: &'static str,
    value: Option<&str>,
    tz: Tz,
) -> Result<Option<DateTime<Tz>>, FrontMatterError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date_string(s, tz)
            .map(Some)
            .ok_or_else(|| FrontMatterError::InvalidDate {
                field,
                value: s.to_string(),
            }),
    }
}

/// Parse a date string in various formats. Naive values are read in `tz`.
pub fn parse_date_string(s: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&tz));
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive).earliest()
}
