use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::io::{Sink, Source};
use crate::job::{Job, Outcome, Report};
use crate::text::replace_counted;

/// A literal search string and its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

/// An ordered list of [`Substitution`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RenameTable(Vec<Substitution>);

impl RenameTable {
    pub fn new() -> Self {
        RenameTable::default()
    }

    pub fn push<F: Into<String>, T: Into<String>>(&mut self, from: F, to: T) {
        self.0.push(Substitution { from: from.into(), to: to.into() });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Substitution> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies each substitution in order, returning the rewritten text and
    /// the total number of replacements.
    ///
    /// ```rust
    /// use afterglow::links::RenameTable;
    ///
    /// let table: RenameTable = [("(/hello-world)", "(/posts/hello-world/)")].into_iter().collect();
    /// let (text, n) = table.apply("see [my post](/hello-world) and (/hello-world)");
    /// assert_eq!(text, "see [my post](/posts/hello-world/) and (/posts/hello-world/)");
    /// assert_eq!(n, 2);
    /// ```
    pub fn apply<'a>(&self, text: &'a str) -> (Cow<'a, str>, usize) {
        let mut text = Cow::Borrowed(text);
        let mut total = 0;
        for sub in &self.0 {
            let (replaced, n) = replace_counted(&text, &sub.from, &sub.to);
            if n > 0 {
                text = Cow::Owned(replaced.into_owned());
                total += n;
            }
        }

        (text, total)
    }
}

impl<F: Into<String>, T: Into<String>> FromIterator<(F, T)> for RenameTable {
    fn from_iter<I: IntoIterator<Item = (F, T)>>(iter: I) -> Self {
        let mut table = RenameTable::new();
        for (from, to) in iter {
            table.push(from, to);
        }

        table
    }
}

/// Rewrites relative links in a fixed set of source documents.
#[derive(Debug, Clone)]
pub struct RenameLinks {
    pub documents: Vec<PathBuf>,
    pub table: RenameTable,
}

impl RenameLinks {
    pub fn new(documents: Vec<PathBuf>, table: RenameTable) -> Self {
        RenameLinks { documents, table }
    }

    fn rename(&self, document: &Path) -> Result<Outcome> {
        if !document.is_file() {
            warn!(path = %document.display(), "document does not exist or is not a file; skipping");
            return Ok(Outcome::Skipped);
        }

        let text = document.read()?;
        match self.table.apply(&text) {
            (_, 0) => Ok(Outcome::Unchanged),
            (renamed, n) => {
                document.write(&renamed)?;
                info!(path = %document.display(), links = n, "renamed links");
                Ok(Outcome::Changed)
            }
        }
    }
}

impl Job for RenameLinks {
    fn name(&self) -> &'static str {
        "rename-links"
    }

    fn run(&self) -> Result<Report> {
        let mut report = Report::new(self.name());
        if self.table.is_empty() {
            warn!("no link substitutions configured");
        }

        for document in &self.documents {
            report.record(document.display(), self.rename(document));
        }

        Ok(report)
    }
}
