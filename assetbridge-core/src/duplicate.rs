//! Copy-on-write duplication for system-owned content.
//!
//! Engine content cannot be replaced in place, so before a system-owned
//! mesh can be exported (and later re-imported over) it is copied into the
//! user library together with its material slots, and the selected actors
//! are swapped onto the copy. A failure part-way removes the duplicates
//! this call created before the error is returned, so the library never
//! keeps a half-wired copy.

use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::host::{AssetStore, BridgeHost, MaterialBinding, ModelRef, SceneHost};
use crate::paths::{split_object_path, strip_extension, PathResolver};
use crate::selection::SelectionCandidate;

/// Outcome of one duplication: the new model and where it now lives.
/// Consumed immediately by the export orchestrator.
#[derive(Debug, Clone)]
pub struct DuplicationResult {
    pub model: ModelRef,
    pub internal_path: String,
    pub materials: Vec<MaterialBinding>,
}

/// Produces safe, user-owned duplicates of system-owned candidates.
pub struct DuplicationGuard<'a> {
    config: &'a BridgeConfig,
}

impl<'a> DuplicationGuard<'a> {
    pub fn new(config: &'a BridgeConfig) -> Self {
        Self { config }
    }

    /// Duplicate a system-owned candidate into the user library and swap
    /// the selected actors onto the duplicate.
    ///
    /// Callers invoke this only after the source classified as
    /// system-owned.
    pub fn duplicate_and_rebind(
        &self,
        host: &mut dyn BridgeHost,
        candidate: &SelectionCandidate,
    ) -> Result<DuplicationResult, BridgeError> {
        let resolver = PathResolver::new(self.config);
        debug_assert!(resolver.is_system_path(strip_extension(&candidate.source_path)));

        let mut created: Vec<String> = Vec::new();
        match self.run(host, &resolver, candidate, &mut created) {
            Ok(result) => Ok(result),
            Err(err) => {
                self.rollback(host, &created);
                Err(err)
            }
        }
    }

    fn run(
        &self,
        host: &mut dyn BridgeHost,
        resolver: &PathResolver<'_>,
        candidate: &SelectionCandidate,
        created: &mut Vec<String>,
    ) -> Result<DuplicationResult, BridgeError> {
        let (source_dir, source_name) = split_object_path(&candidate.source_path);
        let target = resolver.rehome_to_library(source_dir, source_name);

        if host.exists_at_path(&target) {
            return Err(BridgeError::DuplicateConflict(format!(
                "an asset already exists at '{target}'"
            )));
        }
        let duplicate = host
            .duplicate(&candidate.source_path, &target)
            .map_err(|e| BridgeError::DuplicateConflict(format!("'{target}': {e}")))?;
        created.push(target.clone());
        info!(source = %candidate.source_path, target = %target, "duplicated system-owned mesh");

        // Copy each system-owned material into the library and point the
        // duplicate's slot at the copy. User-owned bindings pass through
        // untouched. A slot can repeat a material this call already copied.
        let mut materials = Vec::with_capacity(candidate.materials.len());
        for slot in &candidate.materials {
            let slot_source = strip_extension(&slot.material_path);
            if !resolver.is_system_path(slot_source) {
                materials.push(slot.clone());
                continue;
            }
            let (mat_dir, mat_name) = split_object_path(&slot.material_path);
            let mat_target = resolver.rehome_to_library(mat_dir, mat_name);
            if !created.contains(&mat_target) {
                if host.exists_at_path(&mat_target) {
                    return Err(BridgeError::DuplicateConflict(format!(
                        "an asset already exists at '{mat_target}'"
                    )));
                }
                host.duplicate(&slot.material_path, &mat_target)
                    .map_err(|e| BridgeError::DuplicateConflict(format!("'{mat_target}': {e}")))?;
                created.push(mat_target.clone());
                info!(source = %slot.material_path, target = %mat_target, "duplicated bound material");
            }
            host.rebind_material(duplicate.handle(), slot.index, &mat_target)
                .map_err(BridgeError::host)?;
            materials.push(MaterialBinding {
                slot_name: slot.slot_name.clone(),
                index: slot.index,
                material_path: mat_target,
            });
        }

        // Swap every selected actor still referencing the original onto the
        // duplicate.
        let source_key = strip_extension(&candidate.source_path).to_string();
        for actor in host.selected_actors() {
            let references_source = actor
                .meshes
                .iter()
                .any(|mesh| strip_extension(&mesh.object_path) == source_key);
            if references_source {
                host.replace_actor_asset(actor.id, &target)
                    .map_err(BridgeError::host)?;
            }
        }

        Ok(DuplicationResult {
            model: duplicate,
            internal_path: target,
            materials,
        })
    }

    fn rollback(&self, host: &mut dyn BridgeHost, created: &[String]) {
        for path in created.iter().rev() {
            if let Err(e) = host.delete(path) {
                warn!(path = %path, error = %e, "could not remove partial duplicate");
            }
        }
    }
}
