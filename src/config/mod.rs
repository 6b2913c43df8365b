// src/config/mod.rs
mod models;

pub use models::*;

use config::{Config, Environment};

/// Prefix for environment overrides, e.g. `SERVER_CHECK_TIMEOUT_SECS`.
pub const ENV_PREFIX: &str = "SERVER_CHECK";

/// Merge defaults, `SERVER_CHECK_*` environment variables and command-line
/// overrides (highest precedence), then validate.
pub fn load_settings(overrides: SettingsOverrides) -> Result<Settings, SettingsError> {
    let mut builder = Config::builder()
        .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
        .set_default(
            "registry_path",
            default_registry_path().to_string_lossy().into_owned(),
        )?
        .set_default("color", true)?
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

    if let Some(timeout_secs) = overrides.timeout_secs {
        builder = builder.set_override("timeout_secs", timeout_secs as i64)?;
    }
    if let Some(path) = overrides.registry_path {
        builder = builder.set_override("registry_path", path.to_string_lossy().into_owned())?;
    }
    if let Some(color) = overrides.color {
        builder = builder.set_override("color", color)?;
    }

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
