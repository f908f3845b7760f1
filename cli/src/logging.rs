//! Developer-facing tracing setup.

/// Map a `-v` repeat count to a tracing level.
fn level_for_verbosity(verbosity: u8) -> tracing::Level {
    match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Initialize tracing with a compact, timestamp-free formatter writing to
/// stderr. `RUST_LOG` takes precedence if set; otherwise `verbosity` (the
/// CLI's repeated `-v` flag) sets the max level. User-facing
/// progress/warning/error text goes through
/// plain `println!`/`eprintln!` instead — this is only for developer
/// diagnostics.
pub fn initialize_tracing(verbosity: u8) {
    let format = tracing_subscriber::fmt::format()
        .without_time()
        .with_target(false)
        .compact();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level_for_verbosity(verbosity).to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(format)
        .with_writer(std::io::stderr)
        .init();
}
