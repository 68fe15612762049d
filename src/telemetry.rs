use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_LEVEL: &str = "info";

/// Filter from `RUST_LOG`, falling back to `default_level`.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Installs JSON structured logging on stdout.
///
/// `log` records from actix and the request logger are bridged into the
/// same subscriber. Calling this twice panics, so only `main` does.
pub fn init_telemetry() {
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .json();

    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_LOG_LEVEL))
        .with(formatting_layer)
        .init();
}
