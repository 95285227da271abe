//! Tracing subscriber setup for the binary.
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. Logs go to stderr so command output stays clean.
///
/// Warnings (persistence failures, discarded saved data) are always shown;
/// `verbose` adds debug output. `RUST_LOG` overrides both.
pub fn init_logging(verbose: bool) {
    let app_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let app_filter = Targets::new().with_target(env!("CARGO_CRATE_NAME"), app_level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(app_level.to_string()));

    let fmt_layer = fmt::layer().with_writer(std::io::stderr).without_time();
    let fmt_layer = if verbose {
        fmt_layer.pretty().boxed()
    } else {
        fmt_layer.compact().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(app_filter)
        .with(env_filter)
        .init();
}
