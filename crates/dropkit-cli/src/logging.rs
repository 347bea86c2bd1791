use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. RUST_LOG wins over `default_filter`.
/// Calling it twice is harmless; the first subscriber stays.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
