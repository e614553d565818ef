// src/logging.rs
use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing_subscriber::{EnvFilter, fmt::time::Uptime};

use crate::error::Error;

/// Install the global subscriber. `filter` takes comma-separated directives
/// (`info`, `senate_votes=debug`, …) layered over `RUST_LOG`.
///
/// With `log_file`, events are appended there without ANSI colours and
/// stamped with time since start; otherwise they go to stderr.
pub fn init(filter: &str, log_file: Option<&Path>) -> Result<(), Error> {
    let mut env = EnvFilter::from_default_env();
    for d in filter.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        let directive = d
            .parse()
            .map_err(|e| Error::Logging(format!("bad log directive {d:?}: {e}")))?;
        env = env.add_directive(directive);
    }

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| Error::Logging(format!("cannot open {}: {e}", path.display())))?;
            tracing_subscriber::fmt()
                .with_env_filter(env)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_timer(Uptime::default())
                .with_thread_names(true)
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(env)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    installed.map_err(|e| Error::Logging(e.to_string()))
}
