//! Integration test crate for the Quoin protocol.
//!
//! This crate has almost no library code — it contains integration tests
//! that exercise end-to-end oracle epochs across multiple workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p quoin-integration-tests
//! ```

/// Install a `tracing` subscriber honoring `RUST_LOG`, once per process.
/// Later calls are no-ops so every test can call it unconditionally.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
