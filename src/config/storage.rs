use crate::config::schema::AppConfig;
use crate::error::{Result, UiScoutError};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file path for this platform
pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("uiscout"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::info!("Config file not found at {:?}, using defaults", path);
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        UiScoutError::Config(format!("Failed to read config from {:?}: {}", path, e))
    })?;

    let config: AppConfig = toml::from_str(&content)?;

    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Save configuration to `path`
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            UiScoutError::Config(format!(
                "Failed to create config directory {:?}: {}",
                parent, e
            ))
        })?;
    }

    let content = toml::to_string_pretty(config)?;

    fs::write(path, content).map_err(|e| {
        UiScoutError::Config(format!("Failed to write config to {:?}: {}", path, e))
    })?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

/// Write the default configuration, refusing to clobber an existing file
/// unless `force` is set
pub fn init_config(path: &Path, force: bool) -> Result<AppConfig> {
    if path.exists() && !force {
        return Err(UiScoutError::Config(format!(
            "Config already exists at {:?} (use --force to overwrite)",
            path
        )));
    }
    let config = AppConfig::default();
    save_config(&config, path)?;
    Ok(config)
}
