//! Tracing subscriber setup for the `mirror` binary.
//!
//! Filter comes from `RUST_LOG`, defaulting to `info`. Output goes to stderr
//! so JSON printed on stdout stays machine-readable.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
