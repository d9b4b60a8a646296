//! Configuration file handling for obdpro

use anyhow::{Context, Result};
use obdpro_uds::DashboardConfig;
use std::path::{Path, PathBuf};

/// Load the dashboard configuration
///
/// An explicit path must exist. Without one, the per-user file is read if
/// present and defaults apply otherwise.
pub fn load(path: Option<&Path>) -> Result<DashboardConfig> {
    if let Some(path) = path {
        return DashboardConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()));
    }

    let default_path = config_path()?;
    if default_path.exists() {
        DashboardConfig::from_file(&default_path)
            .with_context(|| format!("Failed to load config file: {}", default_path.display()))
    } else {
        Ok(DashboardConfig::default())
    }
}

/// Get the default config file path
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("obdpro");

    Ok(config_dir.join("config.toml"))
}

/// Apply command-line overrides over file values and validate the result
pub fn merge_with_args(
    mut config: DashboardConfig,
    bridge: Option<&str>,
    assistant: Option<&str>,
) -> Result<DashboardConfig> {
    if let Some(url) = bridge {
        config.bridge.base_url = url.to_string();
    }
    if let Some(endpoint) = assistant {
        config.assistant.endpoint = Some(endpoint.to_string());
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_explicit_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[bridge]\nbase_url = \"http://10.1.1.1\"\n\n[telemetry]\npoll_interval_ms = 250"
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.bridge.base_url, "http://10.1.1.1");
        assert_eq!(config.telemetry.poll_interval_ms, 250);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_args_override_file() {
        let merged = merge_with_args(
            DashboardConfig::default(),
            Some("http://127.0.0.1:8080"),
            Some("http://127.0.0.1:9000/complete"),
        )
        .unwrap();
        assert_eq!(merged.bridge.base_url, "http://127.0.0.1:8080");
        assert_eq!(
            merged.assistant.endpoint.as_deref(),
            Some("http://127.0.0.1:9000/complete")
        );
    }

    #[test]
    fn test_no_args_keeps_file_values() {
        let merged = merge_with_args(DashboardConfig::default(), None, None).unwrap();
        assert_eq!(merged.bridge.base_url, "http://192.168.4.1");
        assert_eq!(merged.assistant.endpoint, None);
    }
}
