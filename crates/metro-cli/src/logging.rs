//! Diagnostic logging on stderr.
//!
//! User-facing messages go through [`crate::output`]; this only carries the
//! `tracing` events emitted by metro-core and metro-git.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding an `EnvFilter` directive.
const LOG_ENV: &str = "METRO_LOG";

/// Filter directive for a `-v` count.
fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "metro_cli=debug,metro_core=debug,metro_git=debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. `METRO_LOG` wins over `-v`.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .without_time()
        .compact();

    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
