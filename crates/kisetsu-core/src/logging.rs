use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset. Covers every `kisetsu_*` target.
pub const DEFAULT_FILTER: &str = "kisetsu=info";

/// Install the global fmt subscriber. `RUST_LOG` overrides the default
/// filter. Calling this twice is harmless; the second call is ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
