//! Configuration types deserialized from `kiln.toml`.

use kiln_common::PathSensitivity;
use serde::Deserialize;

/// Default cap on the number of out-of-date reasons reported per task.
pub const DEFAULT_MAX_MESSAGES: usize = 3;

/// Default gzip compression level for cache artifacts.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// The top-level configuration parsed from `kiln.toml`.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct KilnConfig {
    /// Change-detection settings.
    #[serde(default)]
    pub detection: DetectionConfig,
    /// Input normalization settings for file comparisons.
    #[serde(default)]
    pub normalization: NormalizationConfig,
    /// Cache artifact packing settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Change-detection settings.
#[derive(Debug, Deserialize)]
pub struct DetectionConfig {
    /// Maximum number of out-of-date reasons collected for a task.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

fn default_max_messages() -> usize {
    DEFAULT_MAX_MESSAGES
}

/// Which file details are significant when comparing snapshots.
#[derive(Debug, Default, Deserialize)]
pub struct NormalizationConfig {
    /// Which part of a path identifies a file.
    #[serde(default)]
    pub path_sensitivity: PathSensitivity,
    /// File names excluded from comparison entirely.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Cache artifact packing settings.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Compression applied around the archive stream.
    #[serde(default)]
    pub compression: Compression,
    /// Compression level, `0..=9`.
    #[serde(default = "default_level")]
    pub level: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

fn default_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

/// Compression codec for cache artifacts.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Gzip framing around the archive (default).
    #[default]
    Gzip,
    /// Plain archive stream.
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = KilnConfig::default();
        assert_eq!(config.detection.max_messages, 3);
        assert_eq!(
            config.normalization.path_sensitivity,
            PathSensitivity::Absolute
        );
        assert!(config.normalization.ignore.is_empty());
        assert_eq!(config.cache.compression, Compression::Gzip);
        assert_eq!(config.cache.level, 6);
    }

    #[test]
    fn partial_section_keeps_field_defaults() {
        let config: KilnConfig = toml::from_str("[cache]\ncompression = \"none\"\n").unwrap();
        assert_eq!(config.cache.compression, Compression::None);
        assert_eq!(config.cache.level, DEFAULT_COMPRESSION_LEVEL);
    }
}
