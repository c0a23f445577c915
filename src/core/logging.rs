//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable, e.g.
/// `RUST_LOG=quadsphere::lod=trace` to see individual splits and merges.
///
/// # Example
/// ```no_run
/// quadsphere::core::logging::init();
/// log::info!("Planet initialised");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
    .format_timestamp_millis()
    .init();
}

/// Like [`init`], but safe to call repeatedly (tests, embedding hosts).
pub fn try_init() -> bool {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
    .is_test(cfg!(test))
    .try_init()
    .is_ok()
}
