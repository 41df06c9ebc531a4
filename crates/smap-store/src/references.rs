//! Key conventions shared by pages, components and the public URI index.
//!
//! A site's keys live under its namespace prefix:
//!
//! - `<prefix>/_pages/<id>[@version]` - page revisions (`@published` is the published variant)
//! - `<prefix>/_components/<name>/instances/<id>[@version]` - component data
//! - `<prefix>/_uris/<base64(url without scheme)>` - public URI index, value is a page reference

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Version suffix marking the published variant of a page.
pub const PUBLISHED: &str = "published";

const PAGES_SEGMENT: &str = "/_pages/";
const COMPONENTS_SEGMENT: &str = "/_components/";
const URIS_SEGMENT: &str = "/_uris/";

/// Key prefix under which a site's pages are stored.
#[must_use]
pub fn pages_prefix(site_prefix: &str) -> String {
    format!("{}{PAGES_SEGMENT}", site_prefix.trim_end_matches('/'))
}

/// Namespace prefix of a page reference (everything before `/_pages/`).
///
/// References without a `/_pages/` segment are returned unchanged.
#[must_use]
pub fn page_prefix(reference: &str) -> &str {
    reference
        .split_once(PAGES_SEGMENT)
        .map_or(reference, |(prefix, _)| prefix)
}

/// Strip the `@version` suffix of a reference, if any.
#[must_use]
pub fn base(reference: &str) -> &str {
    reference
        .split_once('@')
        .map_or(reference, |(base, _)| base)
}

/// Replace the version suffix of a reference.
///
/// An empty `version` strips the suffix.
#[must_use]
pub fn replace_version(reference: &str, version: &str) -> String {
    let base = base(reference);
    if version.is_empty() {
        base.to_owned()
    } else {
        format!("{base}@{version}")
    }
}

/// Whether the reference names the published variant.
#[must_use]
pub fn is_published(reference: &str) -> bool {
    reference
        .strip_suffix(PUBLISHED)
        .is_some_and(|rest| rest.ends_with('@'))
}

/// Whether the reference points at a component.
#[must_use]
pub fn is_component(reference: &str) -> bool {
    reference.contains(COMPONENTS_SEGMENT)
}

/// Component name of a component reference
/// (`"article"` for `site/_components/article/instances/a@published`).
#[must_use]
pub fn component_name(reference: &str) -> Option<&str> {
    let (_, rest) = base(reference).split_once(COMPONENTS_SEGMENT)?;
    rest.split('/').next().filter(|name| !name.is_empty())
}

/// Public URI of a URL: the URL without its `http://` or `https://` scheme.
#[must_use]
pub fn url_to_uri(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

/// Key of the public URI index entry for `url` under a namespace prefix.
#[must_use]
pub fn uri_key(prefix: &str, url: &str) -> String {
    format!("{prefix}{URIS_SEGMENT}{}", STANDARD.encode(url_to_uri(url)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_pages_prefix() {
        assert_eq!(pages_prefix("example.com"), "example.com/_pages/");
        assert_eq!(pages_prefix("example.com/"), "example.com/_pages/");
    }

    #[test]
    fn test_page_prefix() {
        assert_eq!(page_prefix("example.com/_pages/abc@published"), "example.com");
        assert_eq!(page_prefix("example.com/blog/_pages/abc"), "example.com/blog");
        assert_eq!(page_prefix("/foo/bar"), "/foo/bar");
    }

    #[test]
    fn test_replace_version() {
        assert_eq!(
            replace_version("site/_pages/a", PUBLISHED),
            "site/_pages/a@published"
        );
        assert_eq!(
            replace_version("site/_pages/a@draft", PUBLISHED),
            "site/_pages/a@published"
        );
        assert_eq!(replace_version("site/_pages/a@published", ""), "site/_pages/a");
    }

    #[test]
    fn test_is_published() {
        assert!(is_published("/baz/zar@published"));
        assert!(!is_published("/foo/bar"));
        assert!(!is_published("/foo/bar@publishedx"));
        assert!(!is_published("/foo/bar@latest"));
    }

    #[test]
    fn test_component_name() {
        assert_eq!(
            component_name("site/_components/article/instances/a@published"),
            Some("article")
        );
        assert_eq!(component_name("/components/a/i"), None);
        assert_eq!(component_name("site/_components/footer"), Some("footer"));
        assert_eq!(component_name("site/_pages/a"), None);
    }

    #[test]
    fn test_url_to_uri() {
        assert_eq!(url_to_uri("http://a/url.html"), "a/url.html");
        assert_eq!(url_to_uri("https://a/url.html"), "a/url.html");
        assert_eq!(url_to_uri("a/url.html"), "a/url.html");
    }

    #[test]
    fn test_uri_key() {
        // base64("a/b") == "YS9i"
        assert_eq!(uri_key("site", "http://a/b"), "site/_uris/YS9i");
    }
}
