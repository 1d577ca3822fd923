/// Initialises `env_logger`: debug output when `verbose`, warnings otherwise.
/// `RUST_LOG` still takes precedence.
pub fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn })
        .format_timestamp(None)
        .parse_default_env()
        .init();
}
