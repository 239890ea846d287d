//! Logging initialization. Thin wrapper around `env_logger`, guarded so
//! repeated calls (e.g. from multiple tests in the same process) don't
//! panic on double-init.

use once_cell::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::new();

/// Initializes the global `log` backend at the given level filter
/// ("trace"/"debug"/"info"/"warn"/"error"). Safe to call more than once;
/// only the first call takes effect.
pub fn init(level: &str) {
    INIT.get_or_init(|| {
        let env = env_logger::Env::default().default_filter_or(level.to_string());
        env_logger::Builder::from_env(env)
            .format_timestamp_millis()
            .init();
    });
}
