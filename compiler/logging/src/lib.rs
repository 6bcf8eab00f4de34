#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Simple logging utilities for the compiler.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Emits a trace event with module prefix. Shown from `-vvv` on.
pub fn trace(module: &str, msg: &str) {
    tracing::trace!("[{}] {}", module, msg);
}

/// Maps a `-v` count to a log level: warnings by default, `-v` for info,
/// `-vv` for debug, `-vvv` and beyond for trace.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Maps a configured level name (`error`, `warn`, `info`, `debug`, `trace`)
/// to a filter. Unknown names fall back to `warn`.
pub fn level_from_name(name: &str) -> LevelFilter {
    name.parse().unwrap_or(LevelFilter::WARN)
}

/// Installs the global stderr subscriber. `RUST_LOG` overrides `level`.
///
/// Only the first call has an effect; returns whether this call installed
/// the subscriber.
pub fn init(level: LevelFilter) -> bool {
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
    match installed {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("keeping existing subscriber: {}", e);
            false
        }
    }
}
