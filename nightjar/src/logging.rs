use tracing_subscriber::EnvFilter;

/// The filter used when `RUST_LOG` is unset.
fn default_directive(verbose: u32, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// Installs a stderr subscriber. `RUST_LOG`, when set, takes precedence over
/// the command-line verbosity.
pub fn init(verbose: u32, quiet: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
