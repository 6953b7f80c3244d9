#![forbid(unsafe_code)]

//! pagekit demo library.
//!
//! Replays a visitor session against the contact page on the wall clock
//! and reports what the visitor saw.

pub mod app;
pub mod cli;
pub mod viewport;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the log subscriber.
///
/// The filter comes from `PAGEKIT_LOG`, then `RUST_LOG`, then `info`. Logs
/// go to stderr so the session report on stdout stays clean. Does nothing
/// if a subscriber is already installed.
pub fn init_logging() {
    let filter = std::env::var("PAGEKIT_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
