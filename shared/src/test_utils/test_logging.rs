use env_logger::Builder;
use log::LevelFilter;
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test logging once per test binary.
///
/// Defaults to `error` to keep test output quiet; set `LOG_LEVEL` (e.g.
/// `LOG_LEVEL=debug`) to see more.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let level_filter = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|level| LevelFilter::from_str(&level).ok())
            .unwrap_or(LevelFilter::Error);

        Builder::from_default_env()
            .filter_level(level_filter)
            .is_test(true)
            .init();
    });
}
