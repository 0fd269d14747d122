use std::path::PathBuf;

xflags::xflags! {
    /// Post-processes a rendered site in place.
    cmd nightjar {
        /// Project root that relative paths resolve against. Defaults to the
        /// current directory.
        optional -C, --root root: PathBuf
        /// Settings file. Defaults to `nightjar.toml` in the project root.
        optional -c, --config config: PathBuf
        /// Log more detail. Repeat for more.
        repeated -v, --verbose
        /// Log only warnings and errors.
        optional -q, --quiet

        /// Add canonical tags, strip `index.html` from the sitemap, and fix
        /// redirect pages, in that order.
        default cmd post-render {}

        /// Add a canonical tag to every page listed in the sitemap.
        cmd canonicals {}

        /// Strip `index.html` from the URLs in the sitemap.
        cmd sitemap {}

        /// Strip `index.html` from redirect targets and add the tracking snippet.
        cmd redirects {}

        /// Rewrite relative links in the configured source documents.
        cmd rename-links {}
    }
}
