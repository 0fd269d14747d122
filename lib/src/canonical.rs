use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fstree::FsTree;
use crate::io::{Sink, Source};
use crate::job::{Job, Outcome, Report};
use crate::route::{canonical_url, site_path};
use crate::sitemap::Sitemap;
use crate::text::{contains, insert_before_head_close};

/// Presence of this marker means a page already declares a canonical URL.
pub const CANONICAL_MARKER: &str = "<link rel=\"canonical\"";

/// The result of trying to add a canonical tag to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// The page with the tag added.
    Inserted(String),
    /// The page already has a canonical tag.
    AlreadyPresent,
    /// The page has no `</head>` to insert before.
    MissingHead,
}

/// Renders the canonical link tag for `url`.
///
/// ```rust
/// use afterglow::canonical::link_tag;
///
/// assert_eq!(link_tag("https://example.com/about/"),
///     r#"<link rel="canonical" href="https://example.com/about/" />"#);
///
/// assert_eq!(link_tag("https://example.com/?a=1&b=\"2\""),
///     r#"<link rel="canonical" href="https://example.com/?a=1&amp;b=&quot;2&quot;" />"#);
/// ```
pub fn link_tag(url: &str) -> String {
    let mut href = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '&' => href.push_str("&amp;"),
            '"' => href.push_str("&quot;"),
            '<' => href.push_str("&lt;"),
            '>' => href.push_str("&gt;"),
            c => href.push(c),
        }
    }

    format!("{CANONICAL_MARKER} href=\"{href}\" />")
}

/// Inserts `tag` into the head of `html` unless a canonical tag is present.
pub fn insert(html: &str, tag: &str) -> Insertion {
    if contains(html, CANONICAL_MARKER) {
        return Insertion::AlreadyPresent;
    }

    match insert_before_head_close(html, tag) {
        Some(html) => Insertion::Inserted(html),
        None => Insertion::MissingHead,
    }
}

/// Adds a canonical tag to every page listed in the sitemap.
///
/// Each `loc` is mapped to a file under `site` with [`site_path()`], and the
/// canonical URL is the `loc` with any trailing `index.html` removed.
#[derive(Debug, Clone)]
pub struct AddCanonicals {
    pub site: PathBuf,
    pub sitemap: PathBuf,
}

impl AddCanonicals {
    pub fn new<S: Into<PathBuf>, M: Into<PathBuf>>(site: S, sitemap: M) -> Self {
        AddCanonicals { site: site.into(), sitemap: sitemap.into() }
    }

    fn add(&self, tree: &FsTree, loc: &str) -> Result<Outcome> {
        let relative = match site_path(loc) {
            Ok(path) => path,
            Err(e) => {
                warn!(url = loc, "skipping sitemap entry: {}", e.message());
                return Ok(Outcome::Skipped);
            }
        };

        let Some(id) = tree.get_file_id(None, &relative) else {
            let path = self.site.join(&relative);
            warn!(url = loc, path = %path.display(), "target does not exist or is not a file; skipping");
            return Ok(Outcome::Skipped);
        };

        let entry = &tree[id];
        let url = canonical_url(loc);
        match insert(&entry.read()?, &link_tag(url)) {
            Insertion::Inserted(html) => {
                entry.write(&html)?;
                info!(path = %entry.path.display(), url, "added canonical tag");
                Ok(Outcome::Changed)
            }
            Insertion::AlreadyPresent => {
                warn!(path = %entry.path.display(), "already contains canonical tag; skipping");
                Ok(Outcome::Unchanged)
            }
            Insertion::MissingHead => {
                warn!(path = %entry.path.display(), "no </head> found; skipping");
                Ok(Outcome::Skipped)
            }
        }
    }
}

impl Job for AddCanonicals {
    fn name(&self) -> &'static str {
        "canonicals"
    }

    fn run(&self) -> Result<Report> {
        let mut report = Report::new(self.name());
        if !self.sitemap.is_file() {
            warn!(sitemap = %self.sitemap.display(), "sitemap not found; no canonical tags added");
            return Ok(report);
        }

        let locs = Sitemap::read(&self.sitemap)?.locations()?;
        let tree = FsTree::build(&self.site)?;
        debug!(entries = locs.len(), "read sitemap");
        for loc in &locs {
            report.record(loc, self.add(&tree, loc));
        }

        Ok(report)
    }
}
