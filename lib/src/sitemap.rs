//! Reading `<loc>` entries out of an XML sitemap and stripping `index.html`
//! from the sitemap in place.
//!
//! A sitemap is a flat list of `<url>` records. The scanner understands
//! comments, CDATA sections, and entity references, and matches elements by
//! their exact, unprefixed name.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use memchr::{memchr, memmem};
use tracing::{info, warn};

use crate::error::Result;
use crate::io::{Sink, Source};
use crate::job::{Job, Outcome, Report};
use crate::route::INDEX_FILE;
use crate::text::replace_counted;

const LOC: &str = "loc";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// A sitemap file held in memory.
#[derive(Debug)]
pub struct Sitemap {
    path: PathBuf,
    text: String,
}

impl Sitemap {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let text = path.as_path().read()?;
        Ok(Sitemap { path, text })
    }

    /// The text of every `loc` element, in document order.
    pub fn locations(&self) -> Result<Vec<String>> {
        locations(&self.text).map_err(|e| e.chain(error! {
            "failed to read sitemap locations",
            "sitemap" => self.path.display(),
        }))
    }

    /// Removes every `index.html` from the sitemap text. Returns the number
    /// of occurrences removed.
    pub fn strip_index(&mut self) -> usize {
        let (stripped, count) = replace_counted(&self.text, INDEX_FILE, "");
        if count > 0 {
            self.text = stripped.into_owned();
        }

        count
    }

    pub fn save(&self) -> Result<()> {
        self.path.write(&self.text)
    }
}

/// Returns the trimmed, entity-decoded text of every `loc` element in `xml`.
/// Empty elements are skipped.
///
/// ```rust
/// use afterglow::sitemap::locations;
///
/// let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/about/index.html</loc></url>
///   <!-- <url><loc>https://example.com/hidden/</loc></url> -->
///   <url><loc> https://example.com/q?a=1&amp;b=2 </loc></url>
/// </urlset>"#;
///
/// assert_eq!(locations(xml).unwrap(), [
///     "https://example.com/about/index.html",
///     "https://example.com/q?a=1&b=2",
/// ]);
/// ```
pub fn locations(xml: &str) -> Result<Vec<String>> {
    let mut locs = vec![];
    let mut pos = 0;
    while let Some(i) = memchr(b'<', &xml.as_bytes()[pos..]) {
        let start = pos + i;
        let rest = &xml[start..];
        if rest.starts_with(COMMENT_OPEN) {
            pos = skip_past(xml, start, COMMENT_CLOSE)?;
        } else if rest.starts_with(CDATA_OPEN) {
            pos = skip_past(xml, start, CDATA_CLOSE)?;
        } else if let Some(open) = open_tag(rest, LOC) {
            let content = start + open.len;
            if open.self_closing {
                warn!(offset = start, "skipping empty <loc> element");
                pos = content;
                continue;
            }

            let (text, end) = element_text(xml, content, LOC)?;
            match text.trim() {
                "" => warn!(offset = start, "skipping empty <loc> element"),
                text => locs.push(text.to_string()),
            }

            pos = end;
        } else {
            pos = start + 1;
        }
    }

    Ok(locs)
}

struct OpenTag {
    /// Length of the tag, including `<` and `>`.
    len: usize,
    self_closing: bool,
}

/// If `input` starts with an opening tag named exactly `name`, returns it.
fn open_tag(input: &str, name: &str) -> Option<OpenTag> {
    let after_name = input.strip_prefix('<')?.strip_prefix(name)?;
    match after_name.bytes().next()? {
        b'>' | b'/' => {},
        b if b.is_ascii_whitespace() => {},
        _ => return None,
    }

    let close = memchr(b'>', after_name.as_bytes())?;
    Some(OpenTag {
        len: 1 + name.len() + close + 1,
        self_closing: after_name[..close].trim_end().ends_with('/'),
    })
}

/// If `input` starts with the closing tag `</name>`, returns its length.
fn close_tag(input: &str, name: &str) -> Option<usize> {
    let after_name = input.strip_prefix("</")?.strip_prefix(name)?;
    let trimmed = after_name.trim_start();
    trimmed.starts_with('>').then(|| input.len() - trimmed.len() + 1)
}

/// Collects the text of the element `name` whose content begins at `start`.
/// Returns the decoded text and the offset just past the closing tag.
fn element_text(xml: &str, start: usize, name: &str) -> Result<(String, usize)> {
    let mut text = String::new();
    let mut pos = start;
    loop {
        let Some(i) = memchr(b'<', &xml.as_bytes()[pos..]) else {
            return err! {
                "malformed sitemap",
                format!("unterminated <{name}> element"),
                "element offset" => start,
            };
        };

        text.push_str(&decode_entities(&xml[pos..pos + i]));
        let tag = pos + i;
        let rest = &xml[tag..];
        if let Some(len) = close_tag(rest, name) {
            return Ok((text, tag + len));
        } else if rest.starts_with(CDATA_OPEN) {
            let body = tag + CDATA_OPEN.len();
            let end = skip_past(xml, tag, CDATA_CLOSE)?;
            text.push_str(&xml[body..end - CDATA_CLOSE.len()]);
            pos = end;
        } else if rest.starts_with(COMMENT_OPEN) {
            pos = skip_past(xml, tag, COMMENT_CLOSE)?;
        } else {
            // Nested markup contributes no text of its own.
            pos = match memchr(b'>', rest.as_bytes()) {
                Some(j) => tag + j + 1,
                None => return err!("malformed sitemap", "unterminated tag", "tag offset" => tag),
            };
        }
    }
}

/// Returns the offset just past the first `terminator` after `start`.
fn skip_past(xml: &str, start: usize, terminator: &str) -> Result<usize> {
    match memmem::find(&xml.as_bytes()[start..], terminator.as_bytes()) {
        Some(i) => Ok(start + i + terminator.len()),
        None => err! {
            "malformed sitemap",
            format!("missing `{terminator}`"),
            "offset" => start,
        },
    }
}

/// Decodes the predefined XML entities and numeric character references.
/// Unknown or malformed references are left as written.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        output.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = memchr(b';', rest.as_bytes())
            .and_then(|semi| Some((decode_entity(&rest[1..semi])?, semi)));

        match decoded {
            Some((c, semi)) => {
                output.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                output.push('&');
                rest = &rest[1..];
            }
        }
    }

    output.push_str(rest);
    Cow::Owned(output)
}

fn decode_entity(entity: &str) -> Option<char> {
    let codepoint = match entity {
        "lt" => return Some('<'),
        "gt" => return Some('>'),
        "amp" => return Some('&'),
        "quot" => return Some('"'),
        "apos" => return Some('\''),
        _ => match entity.strip_prefix('#')? {
            hex if hex.starts_with(['x', 'X']) => u32::from_str_radix(&hex[1..], 16).ok()?,
            dec => dec.parse::<u32>().ok()?,
        }
    };

    char::from_u32(codepoint)
}

/// Strips `index.html` from every URL in a sitemap, in place.
#[derive(Debug, Clone)]
pub struct StripSitemap {
    pub sitemap: PathBuf,
}

impl StripSitemap {
    pub fn new<P: Into<PathBuf>>(sitemap: P) -> Self {
        StripSitemap { sitemap: sitemap.into() }
    }

    fn strip(&self) -> Result<Outcome> {
        let mut sitemap = Sitemap::read(&self.sitemap)?;
        match sitemap.strip_index() {
            0 => Ok(Outcome::Unchanged),
            n => {
                sitemap.save()?;
                info!(sitemap = %self.sitemap.display(), removed = n, "stripped index.html from sitemap");
                Ok(Outcome::Changed)
            }
        }
    }
}

impl Job for StripSitemap {
    fn name(&self) -> &'static str {
        "sitemap"
    }

    fn run(&self) -> Result<Report> {
        let mut report = Report::new(self.name());
        if !self.sitemap.is_file() {
            warn!(sitemap = %self.sitemap.display(), "sitemap not found; nothing to strip");
            return Ok(report);
        }

        report.record(self.sitemap.display(), self.strip());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use super::*;

    #[test]
    fn cdata_and_numeric_references() {
        let xml = "<urlset>\
            <url><loc><![CDATA[https://example.com/a?x=1&y=2]]></loc></url>\
            <url><loc>https://example.com/caf&#xE9;/&#47;</loc></url>\
        </urlset>";

        assert_eq!(locations(xml).unwrap(), [
            "https://example.com/a?x=1&y=2",
            "https://example.com/café//",
        ]);
    }

    #[test]
    fn only_exact_loc_elements_match() {
        let xml = "<url><location>no</location><sm:loc>no</sm:loc>\
            <loc >yes</loc ><lastmod>2024-01-01</lastmod></url>";
        assert_eq!(locations(xml).unwrap(), ["yes"]);
    }

    #[test]
    fn empty_locs_are_skipped() {
        let xml = "<url><loc/></url><url><loc>  </loc></url><url><loc>x</loc></url>";
        assert_eq!(locations(xml).unwrap(), ["x"]);
    }

    #[test]
    fn unterminated_loc_is_an_error() {
        let error = locations("<url><loc>https://example.com/").unwrap_err();
        assert_eq!(error.message(), "malformed sitemap");
        assert!(error.to_string().contains("unterminated <loc> element"));

        assert!(locations("<!-- <loc>x</loc>").is_err());
    }

    #[test]
    fn unknown_entities_pass_through() {
        assert_eq!(decode_entities("a &nbsp; b & c &#xZZ;"), "a &nbsp; b & c &#xZZ;");
        assert_eq!(decode_entities("&lt;&gt;&quot;&apos;&amp;amp;"), "<>\"'&amp;");
        assert!(matches!(decode_entities("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn strip_job_rewrites_sitemap_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.xml");
        fs::write(&path, "<urlset><url><loc>https://example.com/about/index.html</loc></url>\
            <url><loc>https://example.com/index.html</loc></url></urlset>").unwrap();

        let job = StripSitemap::new(&path);
        let report = job.run().unwrap();
        assert_eq!(report.changed, 1);

        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("index.html"));
        assert!(text.contains("<loc>https://example.com/about/</loc>"));

        let report = job.run().unwrap();
        assert_eq!((report.changed, report.unchanged), (0, 1));
    }

    #[test]
    fn missing_sitemap_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let report = StripSitemap::new(dir.path().join("sitemap.xml")).run().unwrap();
        assert_eq!(report.total(), 0);
    }
}
