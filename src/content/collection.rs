//! Post ordering and previous/next linking

use std::cmp::Ordering;

use super::Document;

/// Sort posts newest first. Undated posts go last, in source order.
pub fn sort_posts(posts: &mut [Document]) {
    posts.sort_by(|a, b| match (&a.date, &b.date) {
        (Some(a_date), Some(b_date)) => b_date.cmp(a_date).then_with(|| a.source.cmp(&b.source)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.source.cmp(&b.source),
    });
}

/// The posts either side of a post in the collection
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbours<'a> {
    /// The next older post
    pub prev: Option<&'a Document>,
    /// The next newer post
    pub next: Option<&'a Document>,
}

/// Resolve neighbours for the post at `index` of a newest-first list
pub fn neighbours(posts: &[Document], index: usize) -> Neighbours<'_> {
    Neighbours {
        prev: posts.get(index + 1),
        next: index.checked_sub(1).and_then(|i| posts.get(i)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::frontmatter::parse_date_string;
    use chrono_tz::Tz;

    fn post(source: &str, date: Option<&str>) -> Document {
        let mut doc = Document::new("body");
        doc.source = source.to_string();
        doc.date = date.and_then(|d| parse_date_string(d, Tz::UTC));
        doc
    }

    fn sources(posts: &[Document]) -> Vec<&str> {
        posts.iter().map(|p| p.source.as_str()).collect()
    }

    #[test]
    fn test_sort_newest_first_undated_last() {
        let mut posts = vec![
            post("b.md", None),
            post("old.md", Some("2020-01-01")),
            post("a.md", None),
            post("new.md", Some("2022-06-01")),
        ];
        sort_posts(&mut posts);
        assert_eq!(sources(&posts), vec!["new.md", "old.md", "a.md", "b.md"]);
    }

    #[test]
    fn test_neighbours() {
        let posts = vec![
            post("new.md", Some("2022-01-01")),
            post("mid.md", Some("2021-01-01")),
            post("old.md", Some("2020-01-01")),
        ];

        let first = neighbours(&posts, 0);
        assert!(first.next.is_none());
        assert_eq!(first.prev.map(|p| p.source.as_str()), Some("mid.md"));

        let middle = neighbours(&posts, 1);
        assert_eq!(middle.prev.map(|p| p.source.as_str()), Some("old.md"));
        assert_eq!(middle.next.map(|p| p.source.as_str()), Some("new.md"));

        let last = neighbours(&posts, 2);
        assert!(last.prev.is_none());
        assert_eq!(last.next.map(|p| p.source.as_str()), Some("mid.md"));
    }
}
