use tracing_subscriber::{EnvFilter, fmt};

/// Logs go to stderr so stdout carries only the run report. `RUST_LOG`
/// overrides the verbosity flag.
pub(crate) fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
