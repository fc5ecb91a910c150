use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "flqween_backend=info,tower_http=info";

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default
/// filter; a second call leaves the first subscriber in place.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
