use env_logger::Env;

/// Installs a logger reading its filter from `RUST_LOG`, `warn` by default.
///
/// Another Rust plugin loaded into the same process may have installed one already, in which
/// case that logger stays.
pub fn init() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .try_init();
}
