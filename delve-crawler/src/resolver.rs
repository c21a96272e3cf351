//! Turns raw anchor targets into absolute, comparable URLs.
//!
//! Every URL leaving this module has its fragment removed, so two spellings of
//! the same resource (`/about`, `about`, `https://host/about#team`) compare equal
//! once resolved against the same page.

use crate::error::{CrawlError, Result};
use url::{ParseError, Url};

/// Resolve `href` as found on `page` into an absolute URL.
///
/// Absolute links (scheme and host present) are kept as-is, root-relative
/// links are joined onto the page's origin and anything else is resolved as a
/// sibling of the page's last path segment.
pub fn resolve(href: &str, page: &Url) -> Result<Url> {
    let href = href.trim();

    let resolved = match Url::parse(href) {
        Ok(absolute) => {
            if !is_crawlable_scheme(absolute.scheme()) || !absolute.has_host() {
                return Err(CrawlError::UnsupportedScheme {
                    href: href.to_string(),
                    scheme: absolute.scheme().to_string(),
                });
            }
            absolute
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            page.join(href).map_err(|e| unparsable(href, page, e))?
        }
        Err(e) => return Err(unparsable(href, page, e)),
    };

    Ok(canonicalize(resolved))
}

/// Strip the parts of a URL that never change which resource is fetched.
pub fn canonicalize(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Parse a seed URL, insisting on an http(s) scheme and a host.
pub fn parse_seed(seed: &str) -> Result<Url> {
    let url = Url::parse(seed.trim())
        .map_err(|e| CrawlError::InvalidSeed(format!("{}: {}", seed, e)))?;

    if !is_crawlable_scheme(url.scheme()) || !url.has_host() {
        return Err(CrawlError::InvalidSeed(format!(
            "{}: only http and https URLs with a host can be crawled",
            seed
        )));
    }

    Ok(canonicalize(url))
}

/// True iff scheme, host and port of `url` match those of `origin`.
pub fn same_origin(url: &Url, origin: &Url) -> bool {
    url.origin() == origin.origin()
}

fn is_crawlable_scheme(scheme: &str) -> bool {
    matches!(scheme, "http" | "https")
}

fn unparsable(href: &str, page: &Url, e: ParseError) -> CrawlError {
    CrawlError::UnparsableUrl {
        href: href.to_string(),
        page: page.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_absolute_link_is_kept() {
        let base = page("https://example.com/docs/index.html");
        let resolved = resolve("https://example.com/blog/post", &base).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/blog/post");
    }

    #[test]
    fn test_root_relative_joins_origin() {
        let base = page("https://example.com/docs/guide/intro.html");
        let resolved = resolve("/about", &base).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/about");
    }

    #[test]
    fn test_sibling_relative_replaces_last_segment() {
        let base = page("https://example.com/htmlcss/lesson1");
        let resolved = resolve("lesson2", &base).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/htmlcss/lesson2");

        let root = page("https://example.com/");
        let resolved = resolve("about/team", &root).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/about/team");
    }

    #[test]
    fn test_fragment_is_removed() {
        let base = page("https://example.com/about");
        let resolved = resolve("https://example.com/about#team", &base).unwrap();
        assert_eq!(resolved, base);

        let fragment_only = resolve("#top", &base).unwrap();
        assert_eq!(fragment_only, base);
    }

    #[test]
    fn test_relative_and_absolute_spellings_match() {
        let base = page("https://example.com/docs/a");
        let relative = resolve("b", &base).unwrap();
        let root_relative = resolve("/docs/b", &base).unwrap();
        let absolute = resolve("https://example.com/docs/b#x", &base).unwrap();
        assert_eq!(relative, root_relative);
        assert_eq!(relative, absolute);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let base = page("https://example.com/a/b/c");
        let first = resolve("../d?q=1", &base).unwrap();
        let second = resolve("../d?q=1", &base).unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert_eq!(first.as_str(), "https://example.com/a/d?q=1");
    }

    #[test]
    fn test_protocol_relative_link() {
        let base = page("https://example.com/");
        let resolved = resolve("//cdn.example.org/lib.js", &base).unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.example.org/lib.js");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let base = page("https://example.com/");
        let resolved = resolve("  /contact \n", &base).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/contact");
    }

    #[test]
    fn test_unsupported_schemes_are_rejected() {
        let base = page("https://example.com/");
        for href in [
            "mailto:someone@example.com",
            "javascript:void(0)",
            "tel:+123456",
            "ftp://example.com/file",
        ] {
            let err = resolve(href, &base).unwrap_err();
            assert!(
                matches!(err, CrawlError::UnsupportedScheme { .. }),
                "{} should be rejected, got {:?}",
                href,
                err
            );
        }
    }

    #[test]
    fn test_malformed_links_are_unparsable() {
        let base = page("https://example.com/");
        for href in ["http://", "http://[::1", "//[bad"] {
            let err = resolve(href, &base).unwrap_err();
            assert!(
                matches!(err, CrawlError::UnparsableUrl { .. }),
                "{} should be unparsable, got {:?}",
                href,
                err
            );
        }
    }

    #[test]
    fn test_same_origin() {
        let origin = page("https://example.com/");
        assert!(same_origin(&page("https://example.com/a/b"), &origin));
        assert!(same_origin(&page("https://EXAMPLE.com:443/x"), &origin));
        assert!(!same_origin(&page("http://example.com/"), &origin));
        assert!(!same_origin(&page("https://other.com/x"), &origin));
        assert!(!same_origin(&page("https://sub.example.com/"), &origin));
        assert!(!same_origin(&page("https://example.com:8443/"), &origin));
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(
            parse_seed("https://example.com").unwrap().as_str(),
            "https://example.com/"
        );
        assert_eq!(
            parse_seed("https://example.com/start#intro").unwrap().as_str(),
            "https://example.com/start"
        );
        assert!(matches!(
            parse_seed("example.com"),
            Err(CrawlError::InvalidSeed(_))
        ));
        assert!(matches!(
            parse_seed("file:///etc/passwd"),
            Err(CrawlError::InvalidSeed(_))
        ));
    }
}
