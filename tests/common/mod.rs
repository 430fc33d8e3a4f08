//! Shared helpers for the integration tests (spec.md §4.18: the crate
//! itself never installs a `tracing` subscriber; this is the one place
//! that does, gated by `RUST_LOG`, for local debugging only).

use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).try_init();
    });
}
