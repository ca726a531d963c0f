//! Logging setup.
//!
//! All logs go to **stderr**; stdout carries the plugin handshake line and
//! must stay clean. Filtering follows the `RUST_LOG` environment variable,
//! e.g. `RUST_LOG=terraform_provider_opsgenie=debug`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` for filtering, defaulting to `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer())
        .init();
}

/// Like [`init_logging`], but does not panic if a subscriber is already set.
///
/// Returns `true` if this call installed the subscriber. Useful in tests
/// where several entry points may race to initialize logging.
pub fn try_init_logging() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer())
        .try_init()
        .is_ok()
}
