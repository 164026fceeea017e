use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use sw_types::SweepResult;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{self},
    prelude::*,
};

/// Level implied by the command-line flags. Sweep progress is logged at
/// INFO, so that is the default.
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::ERROR
    } else {
        match verbosity {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Install the global subscriber: a compact stderr layer plus an optional
/// plain-text file layer. `RUST_LOG`, when set, takes precedence over the
/// flags.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> SweepResult<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity, quiet).into())
        .from_env_lossy();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer);

    if let Some(path) = log_file {
        let file = File::create(path)?;

        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_thread_names(true)
            .with_target(true);

        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }

    Ok(())
}
