use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `LONGBOX_LOG` controls the
/// filter (e.g. `LONGBOX_LOG=debug`); defaults to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_env("LONGBOX_LOG")
        .unwrap_or_else(|_| EnvFilter::new("longbox=info,warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
