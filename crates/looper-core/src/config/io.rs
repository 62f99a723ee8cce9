//! YAML file I/O for settings and session scripts
//!
//! Two flavours of loading:
//! - [`read_yaml`] surfaces every failure (used where a broken file must stop
//!   the caller, e.g. a render script)
//! - [`load_config`] never fails and falls back to defaults, logging why

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read and parse a YAML file
pub fn read_yaml<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
}

/// Load configuration from a YAML file
///
/// A missing file yields the default config. An unreadable or invalid file
/// logs a warning and also yields the default.
///
/// ```ignore
/// let config: LooperConfig = load_config(Path::new("looper.yaml"));
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return T::default();
    }

    match read_yaml(path) {
        Ok(config) => {
            log::info!("load_config: Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("load_config: {:#}, using defaults", e);
            T::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: Config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LooperConfig, QuantizeConfig};

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config: LooperConfig = load_config(Path::new("/nonexistent/path/looper.yaml"));
        assert_eq!(config, LooperConfig::default());
    }

    #[test]
    fn test_roundtrip_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("looper.yaml");

        let config = LooperConfig {
            bpm: 93.5,
            undo_levels: 2,
            quantize: QuantizeConfig {
                enabled: true,
                beats: 8,
            },
            ..Default::default()
        };

        save_config(&config, &path).unwrap();
        let loaded: LooperConfig = load_config(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_yaml_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("looper.yaml");
        std::fs::write(&path, "bpm: [not, a, number]").unwrap();

        let config: LooperConfig = load_config(&path);
        assert_eq!(config, LooperConfig::default());
        assert!(read_yaml::<LooperConfig>(&path).is_err());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("looper.yaml");
        std::fs::write(&path, "bpm: 140.0\nquantize:\n  beats: 8\n").unwrap();

        let config: LooperConfig = load_config(&path);
        assert_eq!(config.bpm, 140.0);
        assert_eq!(config.quantize.beats, 8);
        assert!(!config.quantize.enabled);
        assert_eq!(config.sample_rate, LooperConfig::default().sample_rate);
    }
}
