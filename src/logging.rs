use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Installs a stderr fmt subscriber. `RUST_LOG` overrides `level`.
/// A subscriber that is already installed (tests, host apps) is left in place.
pub fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = Registry::default().with(env_filter).with(stderr_layer).try_init();
}
