use std::path::PathBuf;
use std::process::ExitCode;

use afterglow::{run_all, Job};
use afterglow::error::Result;
use afterglow::canonical::AddCanonicals;
use afterglow::sitemap::StripSitemap;
use afterglow::redirect::FixRedirects;
use afterglow::links::RenameLinks;

use crate::config::Config;
use crate::flags::{Nightjar, NightjarCmd};

mod config;
mod flags;
mod logging;

pub const CONFIG_FILE: &str = "nightjar.toml";

/// Every job the driver knows how to run, built from one configuration.
struct Jobs {
    canonicals: AddCanonicals,
    sitemap: StripSitemap,
    redirects: FixRedirects,
    rename_links: RenameLinks,
}

impl Jobs {
    fn new(config: &Config) -> Self {
        Jobs {
            canonicals: AddCanonicals::new(config.site_dir(), config.sitemap()),
            sitemap: StripSitemap::new(config.sitemap()),
            redirects: FixRedirects::new(config.site_dir(), config.tracking()),
            rename_links: RenameLinks::new(config.documents(), config.settings.links.rename.clone()),
        }
    }

    fn select(&self, command: &NightjarCmd) -> Vec<&dyn Job> {
        match command {
            NightjarCmd::PostRender(_) => vec![&self.canonicals as &dyn Job, &self.sitemap, &self.redirects],
            NightjarCmd::Canonicals(_) => vec![&self.canonicals as &dyn Job],
            NightjarCmd::Sitemap(_) => vec![&self.sitemap as &dyn Job],
            NightjarCmd::Redirects(_) => vec![&self.redirects as &dyn Job],
            NightjarCmd::RenameLinks(_) => vec![&self.rename_links as &dyn Job],
        }
    }
}

/// Returns `true` if every selected job ran.
fn run(flags: &Nightjar) -> Result<bool> {
    let root = flags.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let config = Config::discover(&root, flags.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    let jobs = Jobs::new(&config);
    let results = run_all(&jobs.select(&flags.subcommand));
    Ok(results.iter().all(|result| result.is_ok()))
}

pub fn main() -> ExitCode {
    let flags = Nightjar::from_env_or_exit();
    logging::init(flags.verbose, flags.quiet);

    match run(&flags) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{}", e.to_string().trim_end());
            ExitCode::FAILURE
        }
    }
}
