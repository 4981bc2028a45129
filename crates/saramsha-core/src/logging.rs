//! Logging setup.
//!
//! Components log through `tracing`; binaries call [`init`] once at startup.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing compact lines to stderr.
///
/// `RUST_LOG` takes precedence. Otherwise the level is `info`, or `debug`
/// for this crate when `verbose` is set. Later calls are no-ops.
pub fn init(verbose: bool) {
    let default = if verbose {
        "info,saramsha=debug,saramsha_core=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
