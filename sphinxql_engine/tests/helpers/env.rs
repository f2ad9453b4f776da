//! Helper functions for test process setup

/// Installs `env_logger` once per test binary. `RUST_LOG=trace` shows every
/// row pull and mode transition.
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
