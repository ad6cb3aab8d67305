//! Bridge configuration.
//!
//! Two user-facing settings drive every operation: where the content
//! library lives on disk and where interchange files (plus the manifest)
//! are written. Both default to empty and are checked before any I/O.
//! The classification tables describe the host's path conventions: which
//! library prefixes are read-only and which leading segments are virtual
//! view markers rather than real locations.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::BridgeError;

fn default_library_mount() -> String {
    "/Game".to_string()
}

fn default_virtual_roots() -> Vec<String> {
    vec!["/All".to_string(), "/Game".to_string()]
}

fn default_protected_prefixes() -> Vec<String> {
    vec!["/Engine".to_string(), "/Game/LevelPrototyping".to_string()]
}

/// Settings for the bridge, passed explicitly to [`crate::BridgeManager`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// On-disk location of the content library root
    #[serde(default)]
    pub library_root: String,

    /// On-disk location where interchange files and the manifest are written
    #[serde(default)]
    pub export_root: String,

    /// Library mount that user-owned content hangs under
    #[serde(default = "default_library_mount")]
    pub library_mount: String,

    /// Leading segments stripped before mapping a library path to disk
    #[serde(default = "default_virtual_roots")]
    pub virtual_roots: Vec<String>,

    /// Library prefixes considered read-only; content under them must be
    /// duplicated before it can be exported or swapped
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            library_root: String::new(),
            export_root: String::new(),
            library_mount: default_library_mount(),
            virtual_roots: default_virtual_roots(),
            protected_prefixes: default_protected_prefixes(),
        }
    }
}

impl BridgeConfig {
    /// Load settings from a TOML file, falling back to defaults when the
    /// file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?;
        Ok(config)
    }

    /// Persist settings as TOML, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create settings directory '{}'", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("failed to write settings file '{}'", path.display()))?;
        Ok(())
    }

    /// Content library root, or a settings error when it is not configured.
    pub fn require_library_root(&self) -> Result<&Path, BridgeError> {
        if self.library_root.is_empty() {
            return Err(BridgeError::SettingsNotConfigured("content library root"));
        }
        Ok(Path::new(&self.library_root))
    }

    /// Export root, or a settings error when it is not configured.
    pub fn require_export_root(&self) -> Result<&Path, BridgeError> {
        if self.export_root.is_empty() {
            return Err(BridgeError::SettingsNotConfigured("export root"));
        }
        Ok(Path::new(&self.export_root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_have_empty_roots() {
        let config = BridgeConfig::default();
        assert!(config.library_root.is_empty());
        assert!(config.export_root.is_empty());
        assert_eq!(config.library_mount, "/Game");
        assert!(config.protected_prefixes.contains(&"/Engine".to_string()));
    }

    #[test]
    fn require_root_fails_when_unconfigured() {
        let config = BridgeConfig::default();
        assert!(matches!(
            config.require_export_root(),
            Err(BridgeError::SettingsNotConfigured(_))
        ));
        assert!(matches!(
            config.require_library_root(),
            Err(BridgeError::SettingsNotConfigured(_))
        ));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings").join("AssetsBridge.toml");

        let mut config = BridgeConfig::default();
        config.library_root = "/projects/demo/Content".to_string();
        config.export_root = "/projects/demo/Bridge".to_string();
        config.save(&path).unwrap();

        let loaded = BridgeConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = BridgeConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, BridgeConfig::default());
    }

    #[test]
    fn partial_settings_file_keeps_table_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "export_root = \"/tmp/bridge\"\n").unwrap();

        let loaded = BridgeConfig::load(&path).unwrap();
        assert_eq!(loaded.export_root, "/tmp/bridge");
        assert_eq!(loaded.virtual_roots, vec!["/All", "/Game"]);
    }
}
