//! Literal substring operations shared by the jobs.

use std::borrow::Cow;

use memchr::memmem;

/// The closing tag of an HTML document's head section.
pub const HEAD_CLOSE: &str = "</head>";

/// Replaces every occurrence of `from` in `haystack` with `to`, returning the
/// result and the number of replacements made. Borrows when nothing matched.
///
/// An empty `from` never matches.
pub fn replace_counted<'a>(haystack: &'a str, from: &str, to: &str) -> (Cow<'a, str>, usize) {
    if from.is_empty() {
        return (Cow::Borrowed(haystack), 0);
    }

    let finder = memmem::Finder::new(from);
    let mut matches = finder.find_iter(haystack.as_bytes()).peekable();
    if matches.peek().is_none() {
        return (Cow::Borrowed(haystack), 0);
    }

    let mut output = String::with_capacity(haystack.len());
    let (mut last, mut count) = (0, 0);
    for i in matches {
        output.push_str(&haystack[last..i]);
        output.push_str(to);
        last = i + from.len();
        count += 1;
    }

    output.push_str(&haystack[last..]);
    (Cow::Owned(output), count)
}

/// Inserts `fragment` followed by a newline immediately before the first
/// `</head>` in `html`. Returns `None` if `html` has no `</head>`.
pub fn insert_before_head_close(html: &str, fragment: &str) -> Option<String> {
    let i = memmem::find(html.as_bytes(), HEAD_CLOSE.as_bytes())?;
    let mut output = String::with_capacity(html.len() + fragment.len() + 1);
    output.push_str(&html[..i]);
    output.push_str(fragment);
    output.push('\n');
    output.push_str(&html[i..]);
    Some(output)
}

#[inline]
pub fn contains(haystack: &str, needle: &str) -> bool {
    memmem::find(haystack.as_bytes(), needle.as_bytes()).is_some()
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use super::*;

    #[test]
    fn replace_counts_and_borrows() {
        let (out, n) = replace_counted("a/index.html b/index.html", "index.html", "");
        assert_eq!((&*out, n), ("a/ b/", 2));

        let (out, n) = replace_counted("nothing here", "index.html", "");
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(n, 0);

        let (out, n) = replace_counted("abc", "", "x");
        assert_eq!((&*out, n), ("abc", 0));
    }

    #[test]
    fn replacement_does_not_rescan_output() {
        let (out, n) = replace_counted("(/a)(/a)", "(/a)", "(/posts/a/)");
        assert_eq!((&*out, n), ("(/posts/a/)(/posts/a/)", 2));
    }

    #[test]
    fn insert_only_before_first_head_close() {
        let html = "<head><title>x</title></head><body></head></body>";
        let out = insert_before_head_close(html, "<meta>").unwrap();
        assert_eq!(out, "<head><title>x</title><meta>\n</head><body></head></body>");
        assert!(insert_before_head_close("<body></body>", "<meta>").is_none());
    }
}
