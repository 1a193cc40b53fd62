//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Reads the filter from `RUST_LOG`. Safe to call more than once; later
/// calls are ignored.
pub fn init() {
    let _ = env_logger::Builder::from_default_env().try_init();
}

/// Initialize logging with a default filter when `RUST_LOG` is unset
pub fn init_with_default(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}
