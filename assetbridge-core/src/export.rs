//! Drives the interchange export and records the manifest.

use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::host::{MeshCodec, ModelRef};
use crate::manifest::{Manifest, ManifestStore, MaterialSlot, MANIFEST_FILE_NAME};
use crate::paths::{split_object_path, strip_extension, PathResolver};
use crate::selection::SelectionCandidate;

/// Exports every candidate and persists the manifest at the export root.
pub struct ExportOrchestrator<'a> {
    config: &'a BridgeConfig,
}

impl<'a> ExportOrchestrator<'a> {
    pub fn new(config: &'a BridgeConfig) -> Self {
        Self { config }
    }

    /// Export all candidates in supply order. Elements appear in the
    /// manifest in that same order, which also fixes re-import order.
    ///
    /// A codec failure aborts the whole batch and no manifest is
    /// persisted; interchange files already written stay on disk. A
    /// manifest persist failure likewise invalidates the export.
    pub fn export_all(
        &self,
        codec: &mut dyn MeshCodec,
        candidates: &[SelectionCandidate],
    ) -> Result<Manifest, BridgeError> {
        let export_root = self.config.require_export_root()?.to_path_buf();
        let resolver = PathResolver::new(self.config);
        let mut manifest = Manifest::for_export();

        for candidate in candidates {
            if matches!(candidate.model, ModelRef::Unknown(_)) {
                debug!(path = %candidate.source_path, "skipping unsupported object kind");
                continue;
            }

            let (source_dir, short_name) = split_object_path(&candidate.source_path);
            let file_name = format!("{}.{}", short_name, codec.file_extension());
            let dest = resolver.to_external_path(&export_root, source_dir, &file_name);

            if let Some(dest_dir) = dest.parent() {
                std::fs::create_dir_all(dest_dir).map_err(|source| BridgeError::DirectoryCreate {
                    path: dest_dir.to_path_buf(),
                    source,
                })?;
            }

            match candidate.model {
                ModelRef::StaticMesh(handle) => {
                    codec.export_static_mesh(handle, &candidate.materials, &dest)
                }
                ModelRef::SkeletalMesh(handle) => codec.export_skeletal_mesh(handle, &dest),
                ModelRef::Unknown(_) => continue,
            }
            .map_err(|e| BridgeError::Codec {
                asset: candidate.source_path.clone(),
                message: e.to_string(),
            })?;
            info!(source = %candidate.source_path, dest = %dest.display(), "exported mesh");

            let internal_dir = {
                let rel = resolver.strip_virtual_roots(source_dir);
                if rel.is_empty() {
                    "/".to_string()
                } else {
                    rel.to_string()
                }
            };
            let materials = candidate
                .materials
                .iter()
                .map(|binding| MaterialSlot {
                    name: binding.slot_name.clone(),
                    index: binding.index,
                    internal_path: resolver
                        .strip_virtual_roots(strip_extension(&binding.material_path))
                        .to_string(),
                })
                .collect();

            manifest.objects.push(crate::manifest::ExportElement {
                short_name: short_name.to_string(),
                internal_path: internal_dir,
                export_location: dest.to_string_lossy().into_owned(),
                object_type: candidate.model.kind(),
                materials,
            });
        }

        let manifest_path = export_root.join(MANIFEST_FILE_NAME);
        ManifestStore::write(&manifest, &manifest_path)?;
        info!(
            path = %manifest_path.display(),
            objects = manifest.objects.len(),
            "wrote export manifest"
        );
        Ok(manifest)
    }
}
