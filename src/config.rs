// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{DEFAULT_APP_NAME, DEFAULT_LOG_FILTER};
use crate::errors::{CaptureError, CaptureResult};
use crate::profiles::{OutputProfile, OutputProfileSet, default_profiles};
use crate::storage::StorageRoots;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Capture pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name used to namespace the system cache and private directories
    pub app_name: String,
    /// Override for the cache root
    pub cache_dir: Option<PathBuf>,
    /// Override for the private root
    pub private_dir: Option<PathBuf>,
    /// Override for the public pictures root
    pub public_dir: Option<PathBuf>,
    /// Profiles applied to every capture
    pub profiles: Vec<OutputProfile>,
    /// Pass planar frames through a baseline JPEG before decoding
    pub planar_round_trip: bool,
    /// Tracing filter used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            cache_dir: None,
            private_dir: None,
            public_dir: None,
            profiles: default_profiles(),
            planar_round_trip: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> CaptureResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CaptureError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&text)?;
        info!(path = %path.display(), profiles = config.profiles.len(), "Loaded configuration");
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> CaptureResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                debug!("No configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Storage roots: system directories with per-destination overrides applied
    pub fn storage_roots(&self) -> StorageRoots {
        let system = StorageRoots::from_system(&self.app_name);
        StorageRoots {
            cache: self.cache_dir.clone().or(system.cache),
            private: self.private_dir.clone().or(system.private),
            public: self.public_dir.clone().or(system.public),
        }
    }

    /// Configured profiles as a deduplicated set
    pub fn profile_set(&self) -> OutputProfileSet {
        OutputProfileSet::from_profiles(self.profiles.iter().cloned())
    }

    /// Pretty-printed JSON form
    pub fn to_json(&self) -> CaptureResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::Destination;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"cache_dir": "/tmp/cap-cache"}"#).unwrap();
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/cap-cache")));
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert_eq!(config.profiles.len(), 2);
        assert!(config.planar_round_trip);
    }

    #[test]
    fn test_overrides_win() {
        let config = Config {
            cache_dir: Some(PathBuf::from("/x/cache")),
            public_dir: Some(PathBuf::from("/x/pub")),
            ..Default::default()
        };
        let roots = config.storage_roots();
        assert_eq!(roots.cache, Some(PathBuf::from("/x/cache")));
        assert_eq!(roots.public, Some(PathBuf::from("/x/pub")));
    }

    #[test]
    fn test_profile_set_dedupes() {
        let config = Config {
            profiles: vec![
                OutputProfile::new("a", Destination::Cache, 1.0, 1.0),
                OutputProfile::new("a", Destination::Cache, 1.0, 1.0),
            ],
            ..Default::default()
        };
        assert_eq!(config.profile_set().len(), 1);
    }
}
