use std::fs;
use std::path::{Path, PathBuf};

use afterglow::{run_all, Job};
use afterglow::canonical::AddCanonicals;
use afterglow::links::{RenameLinks, RenameTable};
use afterglow::redirect::FixRedirects;
use afterglow::sitemap::StripSitemap;

const HEAD: &str = "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n</head>\n<body></body>\n</html>\n";

struct Site {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Site {
    fn new(pages: &[&str]) -> Site {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("_site");
        for page in pages {
            let path = root.join(page);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, HEAD).unwrap();
        }

        let urls: String = pages.iter()
            .map(|p| format!("  <url><loc>https://example.com/{p}</loc></url>\n"))
            .collect();

        fs::write(root.join("sitemap.xml"), format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
            <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{urls}</urlset>\n")).unwrap();

        Site { _dir: dir, root }
    }

    fn read(&self, path: &str) -> String {
        fs::read_to_string(self.root.join(path)).unwrap()
    }

    fn sitemap(&self) -> PathBuf {
        self.root.join("sitemap.xml")
    }

    fn snapshot(&self) -> Vec<(PathBuf, String)> {
        fn walk(dir: &Path, out: &mut Vec<(PathBuf, String)>) {
            let mut entries: Vec<_> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
            entries.sort();
            for path in entries {
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    out.push((path.clone(), fs::read_to_string(&path).unwrap()));
                }
            }
        }

        let mut out = vec![];
        walk(&self.root, &mut out);
        out
    }
}

fn post_render(site: &Site) {
    let canonicals = AddCanonicals::new(&site.root, site.sitemap());
    let sitemap = StripSitemap::new(site.sitemap());
    let redirects = FixRedirects::new(&site.root, None);
    for result in run_all(&[&canonicals as &dyn Job, &sitemap, &redirects]) {
        assert!(!result.unwrap().has_failures());
    }
}

#[test]
fn about_page_scenario() {
    let site = Site::new(&["about/index.html"]);
    post_render(&site);

    let about = site.read("about/index.html");
    let head = &about[..about.find("</head>").unwrap()];
    assert!(head.contains(r#"<link rel="canonical" href="https://example.com/about/" />"#));
    assert_eq!(about.matches("<link rel=\"canonical\"").count(), 1);

    let sitemap = site.read("sitemap.xml");
    assert!(!sitemap.contains("index.html"));
    assert!(sitemap.contains("<loc>https://example.com/about/</loc>"));
}

#[test]
fn every_page_gets_exactly_one_tag() {
    let pages = ["index.html", "about/index.html", "posts/hello/index.html", "feed.html"];
    let site = Site::new(&pages);
    post_render(&site);

    for (page, url) in pages.iter().zip([
        "https://example.com/",
        "https://example.com/about/",
        "https://example.com/posts/hello/",
        "https://example.com/feed.html",
    ]) {
        let html = site.read(page);
        assert_eq!(html.matches("<link rel=\"canonical\"").count(), 1, "{page}");
        assert!(html.contains(&format!("href=\"{url}\"")), "{page}");
    }
}

#[test]
fn post_render_is_idempotent() {
    let site = Site::new(&["about/index.html", "posts/hello/index.html"]);
    post_render(&site);
    let once = site.snapshot();

    post_render(&site);
    assert_eq!(site.snapshot(), once);
}

#[test]
fn tagged_pages_are_left_alone() {
    let site = Site::new(&["about/index.html"]);
    let tagged = HEAD.replace("</head>", "<link rel=\"canonical\" href=\"https://elsewhere/\" />\n</head>");
    fs::write(site.root.join("about/index.html"), &tagged).unwrap();

    let report = AddCanonicals::new(&site.root, site.sitemap()).run().unwrap();
    assert_eq!((report.changed, report.unchanged), (0, 1));
    assert_eq!(site.read("about/index.html"), tagged);
}

#[test]
fn missing_pages_do_not_stop_the_run() {
    let site = Site::new(&["a/index.html", "b/index.html", "c/index.html"]);
    fs::remove_file(site.root.join("b/index.html")).unwrap();

    let report = AddCanonicals::new(&site.root, site.sitemap()).run().unwrap();
    assert_eq!((report.changed, report.skipped), (2, 1));
    assert!(site.read("c/index.html").contains("href=\"https://example.com/c/\""));
}

#[test]
fn unreadable_page_does_not_stop_the_run() {
    let site = Site::new(&["a/index.html", "b/index.html", "c/index.html"]);
    fs::write(site.root.join("b/index.html"), [b'<', b'h', 0xff, 0xfe, b'>']).unwrap();

    let report = AddCanonicals::new(&site.root, site.sitemap()).run().unwrap();
    assert_eq!((report.changed, report.failed), (2, 1));
    assert!(site.read("a/index.html").contains("href=\"https://example.com/a/\""));
    assert!(site.read("c/index.html").contains("href=\"https://example.com/c/\""));
    assert_eq!(fs::read(site.root.join("b/index.html")).unwrap(), [b'<', b'h', 0xff, 0xfe, b'>']);
}

#[test]
fn non_ascii_pages_are_tagged() {
    let site = Site::new(&["posts/café/index.html", "posts/über/index.html"]);
    post_render(&site);

    let cafe = site.read("posts/café/index.html");
    assert_eq!(cafe.matches("<link rel=\"canonical\"").count(), 1);
    assert!(cafe.contains("href=\"https://example.com/posts/café/\""));
    assert!(site.read("posts/über/index.html").contains("href=\"https://example.com/posts/über/\""));
}

#[test]
fn missing_sitemap_processes_nothing() {
    let site = Site::new(&["about/index.html"]);
    fs::remove_file(site.sitemap()).unwrap();

    let report = AddCanonicals::new(&site.root, site.sitemap()).run().unwrap();
    assert_eq!(report.total(), 0);
    assert_eq!(site.read("about/index.html"), HEAD);
}

#[test]
fn rename_links_in_documents() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("post.ipynb");
    fs::write(&doc, "Read [the intro](/hello-world) first.").unwrap();

    let mut table = RenameTable::new();
    table.push("(/hello-world)", "(/posts/hello-world/)");
    let job = RenameLinks::new(vec![doc.clone()], table);
    job.run().unwrap();

    let text = fs::read_to_string(&doc).unwrap();
    assert!(text.contains("(/posts/hello-world/)"));
    assert!(!text.contains("(/hello-world)"));
}
