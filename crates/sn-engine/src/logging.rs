use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize a tracing subscriber for embedding hosts.
///
/// Prints compact formatted logs to stderr so stdout stays free for the
/// host's own output. The `RUST_LOG` environment variable selects the
/// level, defaulting to "info".
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
