use std::path::{Path, PathBuf};

use serde::Deserialize;

use afterglow::err;
use afterglow::io::{Format, Toml};
use afterglow::error::Result;
use afterglow::links::RenameTable;

pub const DEFAULT_SITE_DIR: &str = "_site";
pub const DEFAULT_SITEMAP: &str = "sitemap.xml";
pub const DEFAULT_TRACKING: &str = "includes/umami.html";

/// Source documents whose relative links point at pre-rename post paths.
const DEFAULT_DOCUMENTS: &[&str] = &[
    "posts/8020-pandas-tutorial/post.ipynb",
    "posts/hello-pyspark/hello-pyspark.ipynb",
    "posts/get-down-with-gradient-descent/get-down.ipynb",
    "posts/how-to-understand-xgboost/how-to-understand-xgboost.ipynb",
    "posts/drafts/conda-cheat-sheet/post.ipynb",
    "posts/gradient-boosting-machine-with-any-loss-function/gbm-any-loss.ipynb",
    "posts/xgboost-from-scratch/xgboost-from-scratch.ipynb",
    "posts/consider-the-decision-tree/consider-the-decision-tree.ipynb",
    "posts/decision-tree-from-scratch/decision-tree-from-scratch.ipynb",
    "posts/how-gradient-boosting-does-gradient-descent/post.ipynb",
    "posts/gradient-boosting-machine-from-scratch/gradient-boosting-machine-from-scratch.ipynb",
];

/// Posts that moved from `/<slug>` to `/posts/<slug>/`.
const DEFAULT_RENAMED_POSTS: &[&str] = &[
    "hello-world",
    "8020-pandas-tutorial",
    "gradient-boosting-machine-from-scratch",
    "get-down-with-gradient-descent",
    "how-gradient-boosting-does-gradient-descent",
    "hello-pyspark",
    "gradient-boosting-machine-with-any-loss-function",
    "consider-the-decision-tree",
    "decision-tree-from-scratch",
    "how-to-understand-xgboost",
    "xgboost-from-scratch",
];

#[derive(Debug)]
pub struct Config {
    /// Directory every relative path in `settings` resolves against.
    pub root: PathBuf,
    pub settings: Settings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// The rendered site, relative to the project root.
    pub site: PathBuf,
    /// The sitemap, relative to `site`.
    pub sitemap: PathBuf,
    pub tracking: Tracking,
    pub links: LinkSettings,
}

/// Either a path to the snippet added to redirect pages, or `true`/`false`
/// to use the default snippet or none at all.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Tracking {
    Enabled(bool),
    Snippet(PathBuf),
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LinkSettings {
    pub documents: Vec<PathBuf>,
    pub rename: RenameTable,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            site: DEFAULT_SITE_DIR.into(),
            sitemap: DEFAULT_SITEMAP.into(),
            tracking: Tracking::Enabled(true),
            links: LinkSettings::default(),
        }
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        LinkSettings {
            documents: DEFAULT_DOCUMENTS.iter().copied().map(PathBuf::from).collect(),
            rename: DEFAULT_RENAMED_POSTS.iter()
                .map(|slug| (format!("(/{slug})"), format!("(/posts/{slug}/)")))
                .collect(),
        }
    }
}

impl Config {
    /// Loads settings from `explicit` if given, which must exist, or else
    /// from `root/nightjar.toml` if that exists. Falls back to defaults.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let settings = match explicit {
            Some(path) if !path.is_file() => return err! {
                "configuration file does not exist",
                "path" => path.display(),
            },
            Some(path) => Toml::read(path)?,
            None => match root.join(crate::CONFIG_FILE) {
                path if path.is_file() => Toml::read(path.as_path())?,
                _ => Settings::default(),
            },
        };

        Ok(Config { root: root.to_path_buf(), settings })
    }

    pub fn site_dir(&self) -> PathBuf {
        self.root.join(&self.settings.site)
    }

    pub fn sitemap(&self) -> PathBuf {
        self.site_dir().join(&self.settings.sitemap)
    }

    pub fn tracking(&self) -> Option<PathBuf> {
        match &self.settings.tracking {
            Tracking::Enabled(true) => Some(self.root.join(DEFAULT_TRACKING)),
            Tracking::Enabled(false) => None,
            Tracking::Snippet(path) => Some(self.root.join(path)),
        }
    }

    pub fn documents(&self) -> Vec<PathBuf> {
        self.settings.links.documents.iter()
            .map(|doc| self.root.join(doc))
            .collect()
    }
}
