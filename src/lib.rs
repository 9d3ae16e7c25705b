//! Shared helpers for the linac integration tests.

use std::sync::Once;

static TRACING: Once = Once::new();

/// Route `tracing` output from the library to the test harness.
///
/// Filter with `RUST_LOG`, e.g. `RUST_LOG=linac_core=debug`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::WARN.into()),
            )
            .with_test_writer()
            .try_init();
    });
}
