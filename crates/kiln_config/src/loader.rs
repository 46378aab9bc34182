//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::KilnConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Loads and validates `kiln.toml` from a project directory.
///
/// A missing file is not an error: the defaults are returned.
pub fn load_config(project_dir: &Path) -> Result<KilnConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(KilnConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<KilnConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<KilnConfig, ConfigError> {
    let config: KilnConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are within range.
fn validate_config(config: &KilnConfig) -> Result<(), ConfigError> {
    if config.detection.max_messages == 0 {
        return Err(ConfigError::ValidationError(
            "detection.max_messages must be at least 1".to_string(),
        ));
    }
    if config.cache.level > 9 {
        return Err(ConfigError::ValidationError(format!(
            "cache.level must be 0..=9, got {}",
            config.cache.level
        )));
    }
    if config.normalization.ignore.iter().any(|name| name.is_empty()) {
        return Err(ConfigError::ValidationError(
            "normalization.ignore entries must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Compression;
    use kiln_common::PathSensitivity;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.detection.max_messages, 3);
        assert_eq!(config.cache.compression, Compression::Gzip);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[detection]
max_messages = 5

[normalization]
path_sensitivity = "name-only"
ignore = ["build.log", ".DS_Store"]

[cache]
compression = "none"
level = 9
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.detection.max_messages, 5);
        assert_eq!(
            config.normalization.path_sensitivity,
            PathSensitivity::NameOnly
        );
        assert_eq!(config.normalization.ignore, vec!["build.log", ".DS_Store"]);
        assert_eq!(config.cache.compression, Compression::None);
        assert_eq!(config.cache.level, 9);
    }

    #[test]
    fn zero_max_messages_rejected() {
        let err = load_config_from_str("[detection]\nmax_messages = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn level_out_of_range_rejected() {
        let err = load_config_from_str("[cache]\nlevel = 12\n").unwrap_err();
        assert!(err.to_string().contains("cache.level"));
    }

    #[test]
    fn empty_ignore_entry_rejected() {
        let err = load_config_from_str("[normalization]\nignore = [\"\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_compression_is_parse_error() {
        let err = load_config_from_str("[cache]\ncompression = \"zstd\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = load_config_from_str("this is not = = toml").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.detection.max_messages, 3);
    }

    #[test]
    fn load_from_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[detection]\nmax_messages = 2\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.detection.max_messages, 2);
    }

    #[test]
    fn load_explicit_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
