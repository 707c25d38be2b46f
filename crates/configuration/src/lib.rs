use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, LogFormat, LoggingConfig, MarketHours, NotificationConfig, TradingLimits,
    WalletLimits,
};
pub use telemetry::init_tracing;

/// Prefix for environment overrides, e.g. `CREASE__TRADING__MAX_DAILY_VOLUME=500`.
pub const ENV_PREFIX: &str = "CREASE";

/// Loads the application configuration.
///
/// Sources are layered: the optional TOML file at `path` first, then
/// `CREASE__`-prefixed environment variables. Missing sections fall back to
/// their defaults, and the result is validated before being returned.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}
