//! Mapping sitemap URLs to rendered files and canonical URLs.

use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{Result, Chainable};

/// The file a directory URL is served from.
pub const INDEX_FILE: &str = "index.html";

/// Base used to resolve sitemap entries that are bare paths.
const RELATIVE_BASE: &str = "http://localhost/";

/// Returns the path, relative to the site directory, of the rendered file
/// that serves `loc`.
///
/// Only the URL's path is used; scheme, host, query and fragment are
/// ignored. Each path segment is percent-decoded, so `caf%C3%A9` and `café`
/// name the same file. A path naming a directory (ending in `/`) resolves to
/// that directory's `index.html`.
///
/// ```rust
/// use std::path::Path;
/// use afterglow::route::site_path;
///
/// let path = site_path("https://example.com/about/index.html").unwrap();
/// assert_eq!(path, Path::new("about/index.html"));
///
/// let path = site_path("https://example.com/posts/hello/").unwrap();
/// assert_eq!(path, Path::new("posts/hello/index.html"));
///
/// let path = site_path("https://example.com").unwrap();
/// assert_eq!(path, Path::new("index.html"));
/// ```
pub fn site_path(loc: &str) -> Result<PathBuf> {
    let url = parse(loc)?;
    let url_path = url.path();

    let mut path = PathBuf::new();
    for segment in url_path.split('/') {
        let segment = percent_decode_str(segment)
            .decode_utf8()
            .chain_with(|| error!("URL path is not valid UTF-8", "url" => loc))?;

        match &*segment {
            "" | "." => continue,
            ".." => return err! {
                "URL path escapes the site directory",
                "url" => loc,
            },
            s if s.contains(['/', '\\']) => return err! {
                "URL path segment contains a path separator",
                "url" => loc,
                "segment" => s,
            },
            s => path.push(s),
        }
    }

    if url_path.is_empty() || url_path.ends_with('/') {
        path.push(INDEX_FILE);
    }

    Ok(path)
}

/// Returns `loc` without a trailing `index.html`.
///
/// ```rust
/// use afterglow::route::canonical_url;
///
/// assert_eq!(canonical_url("https://example.com/about/index.html"), "https://example.com/about/");
/// assert_eq!(canonical_url("https://example.com/about/"), "https://example.com/about/");
/// assert_eq!(canonical_url("https://example.com/feed.xml"), "https://example.com/feed.xml");
/// ```
pub fn canonical_url(loc: &str) -> &str {
    loc.strip_suffix(INDEX_FILE).unwrap_or(loc)
}

fn parse(loc: &str) -> Result<Url> {
    let result = match Url::parse(loc) {
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(RELATIVE_BASE)?;
            base.join(loc)
        }
        result => result,
    };

    result.chain_with(|| error!("invalid sitemap URL", "url" => loc))
}
