use crate::config::schema::AppConfig;
use crate::error::{Result, UiScoutError};
use std::path::Path;

/// Validate Chrome executable path
pub fn validate_chrome_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(UiScoutError::Validation(format!(
            "Chrome executable not found at {:?}",
            path
        )));
    }

    if !path.is_file() {
        return Err(UiScoutError::Validation(format!(
            "Chrome path {:?} is not a file",
            path
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = path.metadata().map_err(|e| {
            UiScoutError::Validation(format!("Cannot read Chrome file metadata: {}", e))
        })?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(UiScoutError::Validation(format!(
                "Chrome executable {:?} is not executable",
                path
            )));
        }
    }

    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(UiScoutError::Validation(format!(
            "Invalid {}: {}. Must start with http:// or https://",
            field, url
        )));
    }
    Ok(())
}

/// Validate a loaded configuration before anything is launched
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if let Some(path) = &config.browser.chrome_path {
        validate_chrome_path(path)?;
    }

    if config.browser.launch_retries == 0 {
        return Err(UiScoutError::Validation(
            "browser.launch_retries must be at least 1".to_string(),
        ));
    }

    if config.runner.workers == 0 {
        return Err(UiScoutError::Validation(
            "runner.workers must be at least 1".to_string(),
        ));
    }

    let t = &config.timeouts;
    if t.poll_interval_ms == 0 {
        return Err(UiScoutError::Validation(
            "timeouts.poll_interval_ms must be greater than 0".to_string(),
        ));
    }
    if t.expect_ms == 0 || t.navigation_ms == 0 || t.command_ms == 0 {
        return Err(UiScoutError::Validation(
            "Timeouts must be greater than 0".to_string(),
        ));
    }

    validate_url("sites.storefront_url", &config.sites.storefront_url)?;
    validate_url("sites.portal_url", &config.sites.portal_url)?;

    if config.credentials.email_env.is_empty() || config.credentials.password_env.is_empty() {
        return Err(UiScoutError::Validation(
            "Credential environment variable names cannot be empty".to_string(),
        ));
    }

    Ok(())
}
