//! Integration helpers for programs that use the store.

pub mod workflow;

pub use workflow::{ResumedConversation, continue_or_start, record_exchange};

/// Initialize tracing with an env-filtered fmt subscriber (`RUST_LOG`, default `info`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
