//! Gathers export candidates from the scene and the content library.

use std::collections::HashSet;
use tracing::debug;

use crate::host::{
    ActorId, AssetStore, BridgeHost, MaterialBinding, ModelRef, SceneHost, WorldTransform,
};
use crate::paths::strip_extension;

/// One mesh queued for export: the tagged model, its source path, the
/// material slots captured at resolution time, and the world placement when
/// the candidate came from a placed scene instance. Created per export
/// invocation and discarded once the manifest is written.
#[derive(Debug, Clone)]
pub struct SelectionCandidate {
    pub model: ModelRef,
    pub source_path: String,
    pub materials: Vec<MaterialBinding>,
    pub transform: Option<WorldTransform>,
    pub actor: Option<ActorId>,
}

/// Normalizes the two selection sources into one candidate list.
#[derive(Default)]
pub struct SelectionResolver;

impl SelectionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Candidates from the current scene selection. Actors without a mesh
    /// component contribute nothing; an empty selection is an empty list.
    pub fn resolve_scene_selection(&self, host: &dyn BridgeHost) -> Vec<SelectionCandidate> {
        let mut candidates = Vec::new();
        for actor in host.selected_actors() {
            for mesh in &actor.meshes {
                let materials = host.material_bindings(mesh.model.handle());
                candidates.push(SelectionCandidate {
                    model: mesh.model,
                    source_path: mesh.object_path.clone(),
                    materials,
                    transform: Some(actor.transform),
                    actor: Some(actor.id),
                });
            }
        }
        candidates
    }

    /// Candidates from the current content library selection.
    pub fn resolve_library_selection(&self, host: &dyn BridgeHost) -> Vec<SelectionCandidate> {
        host.selected_library_assets()
            .into_iter()
            .map(|asset| {
                let materials = host.material_bindings(asset.model.handle());
                SelectionCandidate {
                    model: asset.model,
                    source_path: asset.object_path,
                    materials,
                    transform: None,
                    actor: None,
                }
            })
            .collect()
    }

    /// Both sources merged. When scene and library selections reference the
    /// same asset the scene-sourced candidate wins, since it carries the
    /// world transform. Equality is by normalized asset path.
    pub fn resolve(&self, host: &dyn BridgeHost) -> Vec<SelectionCandidate> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut candidates = Vec::new();

        for candidate in self.resolve_scene_selection(host) {
            if seen.insert(normalized_key(&candidate.source_path)) {
                candidates.push(candidate);
            }
        }
        for candidate in self.resolve_library_selection(host) {
            let key = normalized_key(&candidate.source_path);
            if seen.insert(key) {
                candidates.push(candidate);
            } else {
                debug!(
                    path = %candidate.source_path,
                    "dropping library selection already covered by the scene selection"
                );
            }
        }
        candidates
    }
}

fn normalized_key(path: &str) -> String {
    strip_extension(path).to_string()
}
