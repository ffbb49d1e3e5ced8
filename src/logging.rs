//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber, writing to stderr. The filter comes from
/// `RUST_LOG`, then `configured`, then [`DEFAULT_FILTER`]. Calling this more
/// than once is harmless.
pub fn init_logging(configured: Option<&str>) {
    let mut rejected = None;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER)) {
            Ok(filter) => filter,
            Err(e) => {
                rejected = Some(e.to_string());
                EnvFilter::new(DEFAULT_FILTER)
            }
        }
    });

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .is_ok();

    if let Some(reason) = rejected {
        tracing::warn!(filter = ?configured, %reason, "invalid log filter, using default");
    }
    if installed {
        tracing::debug!("logging initialized");
    }
}
