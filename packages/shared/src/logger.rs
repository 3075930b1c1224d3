//! Logging setup shared by the Parlor binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose spans and events are enabled at the default level.
const APP_TARGETS: &[&str] = &["parlor_shared", "parlor_server", "parlor_client", "tower_http"];

/// Build the default filter directive for a binary.
///
/// The binary target itself and every Parlor crate get `default_log_level`;
/// everything else stays at the `tracing-subscriber` default (`error`).
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    APP_TARGETS
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// `RUST_LOG` takes precedence over the default directive when set.
///
/// # Examples
///
/// ```no_run
/// use parlor_shared::logger::setup_logger;
///
/// setup_logger("parlor-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
