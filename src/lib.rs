//! SMS spam relay: classify inbound email with a hosted model and reply,
//! and retrain that model on demand.

pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod message;
pub mod notifier;
pub mod pipeline;
pub mod reply;
pub mod response;
pub mod storage;
pub mod training;
pub mod trigger;

/// Install the `tracing` subscriber used by both binaries.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Timestamps are left to
/// the log sink.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();
}
