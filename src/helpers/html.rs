//! HTML and XML text helpers

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Simple HTML escaping
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape XML special characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Reduce rendered HTML to plain text: drop tags and comments, decode the
/// entities the markdown renderer emits, and collapse whitespace.
///
/// # Examples
/// ```ignore
/// strip_html("<p>Fish &amp; <em>chips</em></p>\n") // -> "Fish & chips"
/// ```
pub fn strip_html(html: &str) -> String {
    let text = TAG.replace_all(html, "");
    let text = decode_entities(&text);
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn decode_entities(s: &str) -> String {
    // &amp; last so "&amp;lt;" stays "&lt;"
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Rewrite root-relative `href` and `src` attributes to absolute URLs
pub fn absolutize_urls(content: &str, base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
        .replace("href='/", &format!("href='{}/", base_url))
        .replace("src='/", &format!("src='{}/", base_url))
}

/// Strip characters XML 1.0 does not allow
pub fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello</p>\n"), "Hello");
        assert_eq!(
            strip_html("<p>Fish &amp; <em>chips</em></p>\n<p>and   peas</p>"),
            "Fish & chips and peas"
        );
        assert_eq!(strip_html("<p>a<!-- hidden\ncomment -->b</p>"), "ab");
        assert_eq!(strip_html("<p>one</p>\n<p>two</p>"), "one two");
        assert_eq!(strip_html("<code>&amp;lt;</code>"), "&lt;");
    }

    #[test]
    fn test_escape() {
        assert_eq!(html_escape("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
        assert_eq!(escape_xml("Tom's & Jerry's"), "Tom&apos;s &amp; Jerry&apos;s");
    }

    #[test]
    fn test_absolutize_urls() {
        let html = r#"<a href="/blog/">x</a><img src='/i.png'><a href="https://x.org/">"#;
        assert_eq!(
            absolutize_urls(html, "https://me.dev/"),
            r#"<a href="https://me.dev/blog/">x</a><img src='https://me.dev/i.png'><a href="https://x.org/">"#
        );
    }

    #[test]
    fn test_strip_invalid_xml_chars() {
        assert_eq!(strip_invalid_xml_chars("a\u{0008}b\tc"), "ab\tc");
    }
}
