use tracing_subscriber::EnvFilter;

use super::LogFormat;

/// Installs the global subscriber.
///
/// `RUST_LOG` drives the filter (default `info`). Safe to call more than
/// once; later calls are ignored so tests can share one subscriber.
pub fn setup_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_target(true);

    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
}
