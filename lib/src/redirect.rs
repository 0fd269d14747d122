use std::path::PathBuf;

use memchr::memmem;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fstree::{Entry, FsTree};
use crate::io::{Sink, Source};
use crate::job::{Job, Outcome, Report};
use crate::route::INDEX_FILE;
use crate::text::{contains, insert_before_head_close, replace_counted};

/// Generated redirect pages carry this exact title.
pub const REDIRECT_TITLE: &str = "<title>Redirect</title>";

pub fn is_redirect(html: &str) -> bool {
    contains(html, REDIRECT_TITLE)
}

/// Rewrites a redirect page: removes every `index.html` from it and, if
/// `snippet` is given and not already on the page, inserts `snippet` before
/// `</head>`. A copy of `snippet` already on the page is left untouched.
/// Returns `None` when `html` is not a redirect page or when there is
/// nothing to change.
///
/// ```rust
/// use afterglow::redirect::rewrite;
///
/// let page = r#"<html><head><title>Redirect</title>
/// <meta http-equiv="refresh" content="0;URL='/posts/hello/index.html'" />
/// </head></html>"#;
///
/// let rewritten = rewrite(page, Some("<script src=\"/t.js\"></script>")).unwrap();
/// assert!(rewritten.contains("URL='/posts/hello/'"));
/// assert!(rewritten.contains("<script src=\"/t.js\"></script>\n</head>"));
///
/// assert_eq!(rewrite(&rewritten, Some("<script src=\"/t.js\"></script>")), None);
/// assert_eq!(rewrite("<title>Home</title>index.html", None), None);
/// ```
pub fn rewrite(html: &str, snippet: Option<&str>) -> Option<String> {
    if !is_redirect(html) {
        return None;
    }

    let snippet = snippet.filter(|s| !s.trim().is_empty());
    let present = snippet.filter(|s| contains(html, s));
    let (stripped, removed) = strip_index_outside(html, present);
    match snippet.filter(|_| present.is_none()) {
        Some(s) => insert_before_head_close(&stripped, s).or_else(|| (removed > 0).then_some(stripped)),
        None => (removed > 0).then_some(stripped),
    }
}

/// Removes `index.html` from `html` everywhere except inside copies of
/// `keep`. Returns the result and the number of occurrences removed.
fn strip_index_outside(html: &str, keep: Option<&str>) -> (String, usize) {
    let mut output = String::with_capacity(html.len());
    let (mut last, mut removed) = (0, 0);
    if let Some(keep) = keep {
        for i in memmem::find_iter(html.as_bytes(), keep.as_bytes()) {
            let (part, n) = replace_counted(&html[last..i], INDEX_FILE, "");
            output.push_str(&part);
            output.push_str(keep);
            removed += n;
            last = i + keep.len();
        }
    }

    let (part, n) = replace_counted(&html[last..], INDEX_FILE, "");
    output.push_str(&part);
    (output, removed + n)
}

/// Fixes up the redirect pages in the immediate subdirectories of a site.
///
/// A redirect page is a subdirectory's `index.html` whose title is
/// `Redirect`. Its target URL loses any `index.html`, and the optional
/// tracking snippet is added to its head.
#[derive(Debug, Clone)]
pub struct FixRedirects {
    pub site: PathBuf,
    pub tracking: Option<PathBuf>,
}

impl FixRedirects {
    pub fn new<S: Into<PathBuf>>(site: S, tracking: Option<PathBuf>) -> Self {
        FixRedirects { site: site.into(), tracking }
    }

    fn snippet(&self) -> Option<String> {
        let path = self.tracking.as_ref()?;
        if !path.is_file() {
            warn!(path = %path.display(), "tracking snippet not found; redirects will not be tracked");
            return None;
        }

        match path.read() {
            Ok(snippet) => Some(snippet),
            Err(e) => {
                warn!("failed to load tracking snippet; redirects will not be tracked: {}",
                    e.to_string().trim_end());
                None
            }
        }
    }

    fn fix(&self, page: &Entry, snippet: Option<&str>) -> Result<Outcome> {
        let html = page.read()?;
        if !is_redirect(&html) {
            debug!(path = %page.path.display(), "not a redirect page");
            return Ok(Outcome::Skipped);
        }

        match rewrite(&html, snippet) {
            Some(html) => {
                page.write(&html)?;
                info!(path = %page.path.display(), "rewrote redirect page");
                Ok(Outcome::Changed)
            }
            None => Ok(Outcome::Unchanged),
        }
    }
}

impl Job for FixRedirects {
    fn name(&self) -> &'static str {
        "redirects"
    }

    fn run(&self) -> Result<Report> {
        let mut report = Report::new(self.name());
        let snippet = self.snippet();
        let tree = FsTree::build_to_depth(&self.site, Some(2))?;
        for dir in tree.subdirectories(tree.root_id()) {
            if let Some(id) = tree.get_file_id(dir.id, INDEX_FILE) {
                let page = &tree[id];
                report.record(page.path.display(), self.fix(page, snippet.as_deref()));
            }
        }

        Ok(report)
    }
}
