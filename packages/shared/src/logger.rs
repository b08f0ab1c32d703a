//! Logging setup for the planning poker binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers both the library crate of the calling binary and the
/// binary itself. `RUST_LOG` takes precedence when set.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "planpoker-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use planpoker_shared::logger::setup_logger;
///
/// setup_logger("planpoker-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "planpoker_server={level},{binary}={level},tower_http={level}",
                    level = default_log_level,
                    binary = binary_name.replace('-', "_"),
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
