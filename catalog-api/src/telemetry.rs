//! Tracing subscriber setup for processes that embed the catalog.

use catalog_core::{CatalogResult, ConfigError, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "catalog_api=debug,catalog_storage=debug,info";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter. Fails if a global subscriber is
/// already installed.
pub fn init_tracing(format: LogFormat) -> CatalogResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
    };
    installed.map_err(|e| ConfigError::InvalidValue {
        field: "log_format".to_string(),
        value: format!("{:?}", format),
        reason: format!("Failed to init subscriber: {}", e),
    })?;

    tracing::info!(log_format = ?format, "Tracing initialized");
    Ok(())
}
