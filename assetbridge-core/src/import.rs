//! Replays a manifest back into the content library.
//!
//! Each element runs through its own pipeline: compute the destination
//! library path, retire any asset already there, materialize the new mesh
//! from the interchange file, and publish it to the asset index. Failures
//! are per element; the batch reports them all and keeps going.
//!
//! Retiring an existing asset renames it aside and re-points its reference
//! holders at the renamed copy, so they stay valid while the path is free.
//! Only after the replacement is registered do the holders move onto it and
//! the retired copy get deleted; deleting earlier could strand a holder on
//! a dead path if the codec rejects the interchange file.

use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::host::{
    AssetStore, BridgeHost, MeshCodec, ModelRef, ReferenceHolder, ReferenceIndex,
};
use crate::manifest::{ExportElement, Manifest};
use crate::paths::{sanitize_name, split_object_path, PathResolver};

/// Step of the per-element pipeline that was in flight when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    PathComputed,
    ExistingChecked,
    Retired,
    Imported,
    Registered,
}

impl ImportPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportPhase::PathComputed => "computing destination path",
            ImportPhase::ExistingChecked => "checking for an existing asset",
            ImportPhase::Retired => "retiring the existing asset",
            ImportPhase::Imported => "importing the interchange file",
            ImportPhase::Registered => "registering the imported asset",
        }
    }
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element that failed, with the step it failed in.
#[derive(Debug)]
pub struct ElementFailure {
    pub short_name: String,
    pub phase: ImportPhase,
    pub error: BridgeError,
}

/// One element that made it all the way through.
#[derive(Debug)]
pub struct ImportedElement {
    pub short_name: String,
    pub library_path: String,
    pub model: ModelRef,
    pub replaced_existing: bool,
}

/// Batch outcome. The batch itself succeeds whenever the manifest was
/// readable; individual failures are collected here.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: Vec<ImportedElement>,
    pub failures: Vec<ElementFailure>,
}

impl ImportSummary {
    /// Human-readable outcome for UI glue.
    pub fn message(&self) -> String {
        if self.failures.is_empty() {
            return format!("Imported {} object(s). Operation Succeeded.", self.imported.len());
        }
        let failed: Vec<String> = self
            .failures
            .iter()
            .map(|f| format!("'{}' failed while {}: {}", f.short_name, f.phase, f.error))
            .collect();
        format!(
            "Imported {} of {} object(s). {}",
            self.imported.len(),
            self.imported.len() + self.failures.len(),
            failed.join("; ")
        )
    }
}

struct RetiredAsset {
    retired_path: String,
    holders: Vec<ReferenceHolder>,
}

/// Replays manifest elements into the library, in manifest order.
pub struct ImportOrchestrator<'a> {
    config: &'a BridgeConfig,
}

impl<'a> ImportOrchestrator<'a> {
    pub fn new(config: &'a BridgeConfig) -> Self {
        Self { config }
    }

    /// Import every element of the manifest. Fails outright only when the
    /// manifest's operation tag is not understood.
    pub fn import_all(
        &self,
        host: &mut dyn BridgeHost,
        codec: &mut dyn MeshCodec,
        manifest: &Manifest,
    ) -> Result<ImportSummary, BridgeError> {
        manifest.ensure_supported_operation()?;

        let mut summary = ImportSummary::default();
        for element in &manifest.objects {
            match self.import_element(host, codec, element) {
                Ok(imported) => {
                    info!(
                        name = %imported.short_name,
                        path = %imported.library_path,
                        replaced = imported.replaced_existing,
                        "imported element"
                    );
                    summary.imported.push(imported);
                }
                Err((phase, error)) => {
                    warn!(
                        name = %element.short_name,
                        phase = %phase,
                        error = %error,
                        "element failed to import"
                    );
                    summary.failures.push(ElementFailure {
                        short_name: element.short_name.clone(),
                        phase,
                        error,
                    });
                }
            }
        }

        // Bring the library view up to date with everything that landed.
        let new_paths: Vec<String> = summary
            .imported
            .iter()
            .map(|i| i.library_path.clone())
            .collect();
        if !new_paths.is_empty() {
            host.sync_library_view(&new_paths);
        }
        Ok(summary)
    }

    fn import_element(
        &self,
        host: &mut dyn BridgeHost,
        codec: &mut dyn MeshCodec,
        element: &ExportElement,
    ) -> Result<ImportedElement, (ImportPhase, BridgeError)> {
        let resolver = PathResolver::new(self.config);

        let name = sanitize_name(&element.short_name);
        let dest_path = resolver.rehome_to_library(&element.internal_path, &name);
        let (dest_package, _) = split_object_path(&dest_path);
        debug!(name = %name, dest = %dest_path, "computed import destination");

        let existing = host.load_by_path(&dest_path);
        let retired = match existing {
            Some(old) => Some(
                self.retire(host, old, &dest_path, dest_package, &name)
                    .map_err(|e| (ImportPhase::Retired, e))?,
            ),
            None => None,
        };

        let model = codec
            .import_file(Path::new(&element.export_location), dest_package, &name)
            .map_err(|e| {
                (
                    ImportPhase::Imported,
                    BridgeError::Codec {
                        asset: element.short_name.clone(),
                        message: e.to_string(),
                    },
                )
            })?;

        host.register(model.handle())
            .map_err(|e| (ImportPhase::Registered, BridgeError::host(e)))?;

        let replaced_existing = retired.is_some();
        if let Some(retired) = retired {
            for holder in &retired.holders {
                host.rebind(*holder, &dest_path).map_err(|e| {
                    (
                        ImportPhase::Registered,
                        BridgeError::ReferenceReplace {
                            path: dest_path.clone(),
                            message: format!("re-pointing a reference holder failed: {e}"),
                        },
                    )
                })?;
            }
            host.delete(&retired.retired_path).map_err(|e| {
                (
                    ImportPhase::Registered,
                    BridgeError::ReferenceReplace {
                        path: dest_path.clone(),
                        message: format!("removing the retired asset failed: {e}"),
                    },
                )
            })?;
        }

        Ok(ImportedElement {
            short_name: element.short_name.clone(),
            library_path: dest_path,
            model,
            replaced_existing,
        })
    }

    /// Move the asset occupying the destination aside and keep its
    /// reference holders valid on the renamed copy.
    fn retire(
        &self,
        host: &mut dyn BridgeHost,
        old: ModelRef,
        dest_path: &str,
        dest_package: &str,
        name: &str,
    ) -> Result<RetiredAsset, BridgeError> {
        let retired_name = self.next_retired_name(host, dest_package, name);
        host.rename(old.handle(), dest_package, &retired_name)
            .map_err(|e| BridgeError::ReferenceReplace {
                path: dest_path.to_string(),
                message: format!("rename aside failed: {e}"),
            })?;
        let retired_path = format!("{dest_package}/{retired_name}");
        debug!(from = %dest_path, to = %retired_path, "retired existing asset");

        let holders = host.find_references_to(dest_path);
        for holder in &holders {
            host.rebind(*holder, &retired_path)
                .map_err(|e| BridgeError::ReferenceReplace {
                    path: dest_path.to_string(),
                    message: format!("re-pointing a reference holder failed: {e}"),
                })?;
        }
        Ok(RetiredAsset {
            retired_path,
            holders,
        })
    }

    fn next_retired_name(&self, host: &dyn BridgeHost, package: &str, name: &str) -> String {
        let base = format!("{name}_RETIRED");
        if !host.exists_at_path(&format!("{package}/{base}")) {
            return base;
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{base}{counter}");
            if !host.exists_at_path(&format!("{package}/{candidate}")) {
                return candidate;
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::AssetStore;
    use crate::manifest::{ExportElement, MaterialSlot, ObjectType};
    use tempfile::TempDir;

    fn configured(root: &TempDir) -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.library_root = "/projects/demo/Content".to_string();
        config.export_root = root.path().to_string_lossy().into_owned();
        config
    }

    fn element_for(file: &Path, name: &str, internal: &str) -> ExportElement {
        ExportElement {
            short_name: name.to_string(),
            internal_path: internal.to_string(),
            export_location: file.to_string_lossy().into_owned(),
            object_type: ObjectType::StaticMesh,
            materials: vec![MaterialSlot {
                name: "Mat_0".to_string(),
                index: 0,
                internal_path: "/Materials/M_Test".to_string(),
            }],
        }
    }

    fn write_interchange(dir: &Path, name: &str) -> std::path::PathBuf {
        let file = dir.join(format!("{name}.fbx"));
        let payload = serde_json::json!({ "asset": name, "type": "StaticMesh", "materials": [] });
        std::fs::write(&file, serde_json::to_vec(&payload).unwrap()).unwrap();
        file
    }

    #[test]
    fn fresh_import_creates_and_registers_the_asset() {
        let root = TempDir::new().unwrap();
        let config = configured(&root);
        let file = write_interchange(root.path(), "Barrel");

        let mut host = MemoryHost::new();
        let mut codec = host.codec();
        let manifest = Manifest {
            operation: crate::manifest::OPERATION_EXPORT.to_string(),
            objects: vec![element_for(&file, "Barrel", "/Props")],
        };

        let summary = ImportOrchestrator::new(&config)
            .import_all(&mut host, &mut codec, &manifest)
            .unwrap();

        assert_eq!(summary.imported.len(), 1);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.imported[0].library_path, "/Game/Props/Barrel");
        assert!(!summary.imported[0].replaced_existing);
        assert!(host.exists_at_path("/Game/Props/Barrel"));
        assert_eq!(host.registered_paths(), vec!["/Game/Props/Barrel"]);
        assert_eq!(host.library_view(), vec!["/Game/Props/Barrel"]);
    }

    #[test]
    fn reimport_retires_the_existing_asset_and_redirects_references() {
        let root = TempDir::new().unwrap();
        let config = configured(&root);
        let file = write_interchange(root.path(), "Barrel");

        let mut host = MemoryHost::new();
        let old = host.create_static_mesh("/Game/Props/Barrel", &[]);
        let holder = host.add_reference("/Game/Props/Barrel");
        let mut codec = host.codec();
        let manifest = Manifest {
            operation: crate::manifest::OPERATION_EXPORT.to_string(),
            objects: vec![element_for(&file, "Barrel", "/Props")],
        };

        let summary = ImportOrchestrator::new(&config)
            .import_all(&mut host, &mut codec, &manifest)
            .unwrap();

        assert_eq!(summary.imported.len(), 1);
        assert!(summary.imported[0].replaced_existing);

        // Exactly one asset at the path, and it is the new one.
        let current = host.asset_at("/Game/Props/Barrel").unwrap();
        assert_ne!(current.handle(), old);
        assert!(!host.exists_at_path("/Game/Props/Barrel_RETIRED"));
        // The holder followed the replacement.
        assert_eq!(host.reference_target(holder).unwrap(), "/Game/Props/Barrel");
    }

    #[test]
    fn codec_failure_is_per_element() {
        let root = TempDir::new().unwrap();
        let config = configured(&root);
        let good = write_interchange(root.path(), "Barrel");
        let bad = write_interchange(root.path(), "Crate");

        let mut host = MemoryHost::new();
        let mut codec = host.codec();
        codec.fail_import_of("Crate");
        let manifest = Manifest {
            operation: crate::manifest::OPERATION_EXPORT.to_string(),
            objects: vec![
                element_for(&bad, "Crate", "/Props"),
                element_for(&good, "Barrel", "/Props"),
            ],
        };

        let summary = ImportOrchestrator::new(&config)
            .import_all(&mut host, &mut codec, &manifest)
            .unwrap();

        assert_eq!(summary.imported.len(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].short_name, "Crate");
        assert_eq!(summary.failures[0].phase, ImportPhase::Imported);
        assert!(host.exists_at_path("/Game/Props/Barrel"));
        assert!(!host.exists_at_path("/Game/Props/Crate"));
        assert!(summary.message().contains("Crate"));
    }

    #[test]
    fn failed_import_keeps_the_retired_asset_reachable() {
        let root = TempDir::new().unwrap();
        let config = configured(&root);
        let missing = root.path().join("Barrel.fbx"); // never written

        let mut host = MemoryHost::new();
        host.create_static_mesh("/Game/Props/Barrel", &[]);
        let holder = host.add_reference("/Game/Props/Barrel");
        let mut codec = host.codec();
        let manifest = Manifest {
            operation: crate::manifest::OPERATION_EXPORT.to_string(),
            objects: vec![element_for(&missing, "Barrel", "/Props")],
        };

        let summary = ImportOrchestrator::new(&config)
            .import_all(&mut host, &mut codec, &manifest)
            .unwrap();

        assert_eq!(summary.failures.len(), 1);
        // The old asset survives under the retired name and the holder
        // still resolves to it.
        assert!(host.exists_at_path("/Game/Props/Barrel_RETIRED"));
        assert_eq!(
            host.reference_target(holder).unwrap(),
            "/Game/Props/Barrel_RETIRED"
        );
    }

    #[test]
    fn import_names_are_sanitized() {
        let root = TempDir::new().unwrap();
        let config = configured(&root);
        let file = write_interchange(root.path(), "Barrel");

        let mut host = MemoryHost::new();
        let mut codec = host.codec();
        let mut element = element_for(&file, "Barrel (v2)", "/Props");
        element.export_location = file.to_string_lossy().into_owned();
        let manifest = Manifest {
            operation: crate::manifest::OPERATION_EXPORT.to_string(),
            objects: vec![element],
        };

        let summary = ImportOrchestrator::new(&config)
            .import_all(&mut host, &mut codec, &manifest)
            .unwrap();

        assert_eq!(summary.imported[0].library_path, "/Game/Props/Barrel__v2_");
    }

    #[test]
    fn unsupported_operation_tag_is_fatal() {
        let root = TempDir::new().unwrap();
        let config = configured(&root);

        let mut host = MemoryHost::new();
        let mut codec = host.codec();
        let manifest = Manifest {
            operation: "ExternalTool".to_string(),
            objects: vec![],
        };

        let err = ImportOrchestrator::new(&config)
            .import_all(&mut host, &mut codec, &manifest)
            .unwrap_err();
        assert!(matches!(err, BridgeError::Manifest(_)));
    }

    #[test]
    fn retired_names_avoid_collisions() {
        let root = TempDir::new().unwrap();
        let config = configured(&root);
        let file = write_interchange(root.path(), "Barrel");

        let mut host = MemoryHost::new();
        host.create_static_mesh("/Game/Props/Barrel", &[]);
        // A leftover from an earlier run occupies the retired slot; the
        // rename picks the next free suffix and the import still succeeds.
        host.create_static_mesh("/Game/Props/Barrel_RETIRED", &[]);
        let mut codec = host.codec();
        let manifest = Manifest {
            operation: crate::manifest::OPERATION_EXPORT.to_string(),
            objects: vec![element_for(&file, "Barrel", "/Props")],
        };

        let summary = ImportOrchestrator::new(&config)
            .import_all(&mut host, &mut codec, &manifest)
            .unwrap();

        assert_eq!(summary.imported.len(), 1);
        // The pre-existing leftover is untouched; the freshly retired copy
        // was deleted after the swap.
        assert!(host.exists_at_path("/Game/Props/Barrel_RETIRED"));
        assert!(!host.exists_at_path("/Game/Props/Barrel_RETIRED2"));
        assert!(host.exists_at_path("/Game/Props/Barrel"));
    }
}
