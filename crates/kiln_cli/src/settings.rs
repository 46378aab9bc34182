//! Shared helpers for turning configuration into library objects.

use std::path::PathBuf;

use kiln_changes::NormalizationStrategy;
use kiln_config::{CacheConfig, Compression, KilnConfig, NormalizationConfig};
use kiln_pack::{ArchivePacker, GzipPacker, Packer};

use crate::GlobalArgs;

/// Loads configuration from `--config` if given, otherwise from `kiln.toml`
/// in the current directory. `--config` may name a file or a directory.
pub fn load_settings(global: &GlobalArgs) -> Result<KilnConfig, Box<dyn std::error::Error>> {
    let config = match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_file() {
                kiln_config::load_config_file(&p)?
            } else {
                kiln_config::load_config(&p)?
            }
        }
        None => kiln_config::load_config(&std::env::current_dir()?)?,
    };
    Ok(config)
}

/// The packer selected by the cache settings. `no_compress` forces a plain
/// archive.
pub fn packer(cache: &CacheConfig, no_compress: bool) -> Box<dyn Packer> {
    match (cache.compression, no_compress) {
        (Compression::Gzip, false) => {
            Box::new(GzipPacker::with_level(ArchivePacker::new(), cache.level))
        }
        _ => Box::new(ArchivePacker::new()),
    }
}

/// The file comparison strategy described by the normalization settings.
pub fn normalization(config: &NormalizationConfig) -> NormalizationStrategy {
    NormalizationStrategy::new(config.path_sensitivity, config.ignore.iter().cloned())
}
