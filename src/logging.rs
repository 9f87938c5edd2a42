use env_logger::Env;

const DEFAULT_FILTER: &str = "info";

/// Install the process logger. `RUST_LOG` overrides the default `info` filter.
/// Safe to call more than once; later calls leave the first logger in place.
pub fn init_logging() {
    let result = env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .format_timestamp_millis()
        .try_init();

    if let Err(err) = result {
        log::debug!("Logger already initialized: {err}");
    }
}
