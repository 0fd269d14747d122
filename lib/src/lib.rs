#![doc = svgbobdoc::transform!(
//! A toolkit for post-processing statically generated web sites.
//!
//! # Overview
//!
//! Afterglow runs after a static site generator has written its output. It
//! consumes the rendered HTML and XML files and rewrites them in place with
//! small, idempotent text substitutions. Running any job twice leaves the
//! site exactly as running it once did.
//!
//! ```svgbob
//!   +-------------+        +---------------+        +-----------+
//!   | sitemap.xml +------->| AddCanonicals +------->| pages     |
//!   +------+------+        +---------------+        +-----------+
//!          |
//!          v
//!   +--------------+       +--------------+         +-----------+
//!   | StripSitemap |       | FixRedirects +-------->| redirects |
//!   +--------------+       +--------------+         +-----------+
//!
//!   +-------------+        +-------------+          +-----------+
//!   | RenameTable +------->| RenameLinks +--------->| documents |
//!   +-------------+        +-------------+          +-----------+
//! ```
//!
//! The jobs are:
//!
//!   * [`AddCanonicals`](canonical::AddCanonicals): reads every `<loc>` from
//!     the sitemap, finds the rendered file for it, and inserts
//!     `<link rel="canonical" href="..." />` before `</head>` unless the page
//!     already declares a canonical URL.
//!
//!   * [`StripSitemap`](sitemap::StripSitemap): removes `index.html` from the
//!     URLs in the sitemap.
//!
//!   * [`FixRedirects`](redirect::FixRedirects): removes `index.html` from the
//!     target of generated redirect pages and adds a tracking snippet.
//!
//!   * [`RenameLinks`](links::RenameLinks): applies a table of literal
//!     substitutions to source documents, typically to point relative links
//!     at renamed pages.
//!
//! ## Running
//!
//! Every job implements [`Job`]. Jobs run one at a time, usually through
//! [`run_all()`], and each reports what it did to every file it touched in a
//! [`Report`]. A problem with one file is logged and counted; it never stops
//! the rest of the job.
)]

#[macro_use]
pub mod error;
pub mod fstree;
pub mod io;
pub mod text;
pub mod route;
pub mod job;
pub mod sitemap;
pub mod canonical;
pub mod redirect;
pub mod links;

pub use job::{Job, Outcome, Report, run_all};
