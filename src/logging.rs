use tracing_subscriber::EnvFilter;

/// Initialise logging. The default level is `info`; debug level is opted
/// into via the settings file. `RUST_LOG` can override the filter only when
/// debug logging is enabled, so a stray environment variable never makes the
/// engine chatty inside someone's browsing session.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
