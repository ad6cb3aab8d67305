//! The bridge façade: the operations the editor's UI glue actually calls.
//!
//! Every entry point takes the host capabilities as arguments, runs
//! synchronously on the caller's thread, and returns a typed result. The
//! glue layer decides how to present it; `OperationReport` carries the
//! success flag and human-readable message it needs. Concurrent
//! invocations against the same project are not defended against here; the
//! host is expected to disable the triggering commands while one runs.

use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::duplicate::DuplicationGuard;
use crate::error::BridgeError;
use crate::export::ExportOrchestrator;
use crate::host::{AssetStore, BridgeHost, MeshCodec, SceneHost};
use crate::import::{ImportOrchestrator, ImportSummary};
use crate::manifest::{Manifest, ManifestStore, MANIFEST_FILE_NAME};
use crate::paths::{strip_extension, PathResolver};
use crate::selection::{SelectionCandidate, SelectionResolver};

/// Success flag plus message, the shape UI glue presents to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub success: bool,
    pub message: String,
}

impl OperationReport {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Collapse a façade result into the flag/message pair.
    pub fn from_result(result: Result<OperationReport, BridgeError>) -> Self {
        match result {
            Ok(report) => report,
            Err(error) => Self::failed(error.to_string()),
        }
    }
}

/// Sequences selection, duplication, export and import over the host
/// capabilities.
pub struct BridgeManager {
    config: BridgeConfig,
}

impl BridgeManager {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Replace the selected scene actors with instances of the selected
    /// library assets. Pure scene mutation; the manifest is not involved.
    pub fn execute_swap(&self, host: &mut dyn BridgeHost) -> Result<OperationReport, BridgeError> {
        let actors = host.selected_actors();
        if actors.is_empty() {
            return Err(BridgeError::EmptySceneSelection);
        }
        let assets = host.selected_library_assets();
        if assets.is_empty() {
            return Err(BridgeError::EmptyLibrarySelection);
        }

        for asset in &assets {
            match host.resolve_factory(asset) {
                Some(strategy) => {
                    host.replace_selected_actors(&strategy, asset)
                        .map_err(|e| {
                            BridgeError::Host(format!(
                                "replacing actors with '{}' failed: {e}",
                                asset.object_path
                            ))
                        })?;
                    info!(asset = %asset.object_path, ?strategy, "replaced selected actors");
                }
                None => {
                    warn!(asset = %asset.object_path, "no actor factory for asset, skipping");
                }
            }
        }
        Ok(OperationReport::succeeded("Operation Succeeded."))
    }

    /// Export the current selection to the export root and write the
    /// manifest. System-owned candidates are duplicated into the user
    /// library first and the selection is rebound to the duplicates.
    pub fn start_export(
        &self,
        host: &mut dyn BridgeHost,
        codec: &mut dyn MeshCodec,
    ) -> Result<OperationReport, BridgeError> {
        self.config.require_library_root()?;
        self.config.require_export_root()?;

        let candidates = SelectionResolver::new().resolve(host);
        if candidates.is_empty() {
            return Err(BridgeError::NoSelection(
                "You must select at least 1 item in the level or content browser to export"
                    .to_string(),
            ));
        }
        info!(count = candidates.len(), "resolved export selection");

        let resolver = PathResolver::new(&self.config);
        let guard = DuplicationGuard::new(&self.config);
        let mut prepared = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if resolver.is_system_path(strip_extension(&candidate.source_path)) {
                let duplicated = guard.duplicate_and_rebind(host, &candidate)?;
                prepared.push(SelectionCandidate {
                    model: duplicated.model,
                    source_path: duplicated.internal_path,
                    materials: duplicated.materials,
                    transform: candidate.transform,
                    actor: candidate.actor,
                });
            } else {
                prepared.push(candidate);
            }
        }

        let manifest = ExportOrchestrator::new(&self.config).export_all(codec, &prepared)?;
        Ok(OperationReport::succeeded(format!(
            "Exported {} object(s). Operation Succeeded.",
            manifest.objects.len()
        )))
    }

    /// Read the manifest at the export root and replay it into the
    /// library.
    pub fn generate_import(
        &self,
        host: &mut dyn BridgeHost,
        codec: &mut dyn MeshCodec,
    ) -> Result<OperationReport, BridgeError> {
        let export_root = self.config.require_export_root()?;
        let manifest_path = export_root.join(MANIFEST_FILE_NAME);
        let manifest: Manifest = ManifestStore::read(&manifest_path)?;
        info!(
            path = %manifest_path.display(),
            objects = manifest.objects.len(),
            "read import manifest"
        );

        let summary: ImportSummary =
            ImportOrchestrator::new(&self.config).import_all(host, codec, &manifest)?;
        Ok(OperationReport {
            success: true,
            message: summary.message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;

    #[test]
    fn swap_requires_both_selections() {
        let manager = BridgeManager::new(BridgeConfig::default());
        let mut host = MemoryHost::new();

        let err = manager.execute_swap(&mut host).unwrap_err();
        assert!(matches!(err, BridgeError::EmptySceneSelection));

        host.create_static_mesh("/Game/Props/Barrel", &[]);
        let actor = host.spawn_actor("/Game/Props/Barrel");
        host.select_actors(&[actor]);
        let err = manager.execute_swap(&mut host).unwrap_err();
        assert!(matches!(err, BridgeError::EmptyLibrarySelection));
    }

    #[test]
    fn swap_replaces_selected_actors() {
        let manager = BridgeManager::new(BridgeConfig::default());
        let mut host = MemoryHost::new();
        host.create_static_mesh("/Game/Props/Barrel", &[]);
        host.create_static_mesh("/Game/Props/Crate", &[]);
        let actor = host.spawn_actor("/Game/Props/Barrel");
        host.select_actors(&[actor]);
        host.select_library(&["/Game/Props/Crate"]);

        let report = manager.execute_swap(&mut host).unwrap();
        assert!(report.success);
        assert_eq!(report.message, "Operation Succeeded.");
        assert_eq!(host.actor_asset(actor).unwrap(), "/Game/Props/Crate");
    }

    #[test]
    fn swap_skips_assets_without_a_factory() {
        let manager = BridgeManager::new(BridgeConfig::default());
        let mut host = MemoryHost::new();
        host.create_static_mesh("/Game/Props/Barrel", &[]);
        host.create_asset("/Game/Audio/Theme");
        let actor = host.spawn_actor("/Game/Props/Barrel");
        host.select_actors(&[actor]);
        host.select_library(&["/Game/Audio/Theme"]);

        // No factory resolves for the non-mesh asset; the swap still
        // reports success and the actor keeps its asset.
        let report = manager.execute_swap(&mut host).unwrap();
        assert!(report.success);
        assert_eq!(host.actor_asset(actor).unwrap(), "/Game/Props/Barrel");
    }

    #[test]
    fn export_requires_configured_settings() {
        let manager = BridgeManager::new(BridgeConfig::default());
        let mut host = MemoryHost::new();
        host.create_static_mesh("/Game/Props/Barrel", &[]);
        host.select_library(&["/Game/Props/Barrel"]);
        let mut codec = host.codec();

        let err = manager.start_export(&mut host, &mut codec).unwrap_err();
        assert!(matches!(err, BridgeError::SettingsNotConfigured(_)));
    }

    #[test]
    fn report_collapses_errors_to_messages() {
        let report = OperationReport::from_result(Err(BridgeError::EmptySceneSelection));
        assert!(!report.success);
        assert_eq!(report.message, "You must select at least 1 item in the level");

        let report =
            OperationReport::from_result(Ok(OperationReport::succeeded("Operation Succeeded.")));
        assert!(report.success);
    }
}
