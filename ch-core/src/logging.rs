//! Crate-standard `tracing` setup.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence when it is set; otherwise `verbosity` (`trace`, `debug`, `info`,
/// `warn`, `error`, or any `EnvFilter` directive) decides what is emitted. Calling this more than
/// once is harmless: only the first subscriber sticks.
pub fn setup(verbosity: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity));

    if tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed, keeping the existing one");
    }
}
