//! Diagnostic logging on stderr via `tracing-subscriber`.
//!
//! `RUST_LOG` wins when set; otherwise the filter follows `-v`/`-q`.

use tracing_subscriber::EnvFilter;

/// Filter directive for a verbosity level when `RUST_LOG` is unset.
pub fn default_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "refseq_fetch=info,warn",
        1 => "refseq_fetch=debug,info",
        2 => "refseq_fetch=trace,info",
        _ => "trace",
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .try_init();
}
