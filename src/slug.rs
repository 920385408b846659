//! Slug validation.
//!
//! Every page, section, rack, article and document has a slug that doubles
//! as its URL path segment:
//!
//! - `/about/` → page `about`
//! - `/article/first-light/` → article `first-light`
//! - `/rack/news/` → rack `news`
//!
//! Slugs are written by hand in `site.toml`, so they are checked rather than
//! derived. A valid slug is lowercase ASCII letters, digits, `-` and `_`,
//! non-empty, and does not start or end with `-`.

/// Why a slug was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugProblem {
    Empty,
    /// First offending character.
    InvalidChar(char),
    EdgeDash,
}

impl std::fmt::Display for SlugProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlugProblem::Empty => write!(f, "slug is empty"),
            SlugProblem::InvalidChar(c) => write!(f, "invalid character {c:?}"),
            SlugProblem::EdgeDash => write!(f, "slug starts or ends with '-'"),
        }
    }
}

/// Check that `slug` is safe to use as a URL path segment.
pub fn check_slug(slug: &str) -> Result<(), SlugProblem> {
    if slug.is_empty() {
        return Err(SlugProblem::Empty);
    }
    if let Some(c) = slug
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
    {
        return Err(SlugProblem::InvalidChar(c));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(SlugProblem::EdgeDash);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words_ok() {
        assert_eq!(check_slug("about"), Ok(()));
        assert_eq!(check_slug("first-light"), Ok(()));
        assert_eq!(check_slug("issue_42"), Ok(()));
        assert_eq!(check_slug("2024"), Ok(()));
    }

    #[test]
    fn empty_rejected() {
        assert_eq!(check_slug(""), Err(SlugProblem::Empty));
    }

    #[test]
    fn uppercase_rejected() {
        assert_eq!(check_slug("About"), Err(SlugProblem::InvalidChar('A')));
    }

    #[test]
    fn spaces_and_slashes_rejected() {
        assert_eq!(check_slug("my page"), Err(SlugProblem::InvalidChar(' ')));
        assert_eq!(check_slug("a/b"), Err(SlugProblem::InvalidChar('/')));
    }

    #[test]
    fn non_ascii_rejected() {
        assert_eq!(check_slug("café"), Err(SlugProblem::InvalidChar('é')));
    }

    #[test]
    fn edge_dash_rejected() {
        assert_eq!(check_slug("-news"), Err(SlugProblem::EdgeDash));
        assert_eq!(check_slug("news-"), Err(SlugProblem::EdgeDash));
    }
}
