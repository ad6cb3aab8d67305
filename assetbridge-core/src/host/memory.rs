//! In-memory reference host.
//!
//! A deterministic, single-threaded stand-in for the editor used by the
//! test-suite: a path-keyed asset index, placed actors, selections, a
//! reference-holder table, and a placeholder interchange codec that writes
//! real files so the export/import pipeline can be driven end to end.
//! Host and codec share one world behind an `Rc`, matching how the real
//! editor's subsystems all view one object graph.

use anyhow::{bail, Context, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::manifest::ObjectType;
use crate::paths::strip_extension;

use super::{
    ActorId, AssetDescriptor, AssetHandle, AssetStore, MaterialBinding, MeshCodec, ModelRef,
    ReferenceHolder, ReferenceIndex, SceneActor, SceneHost, SpawnStrategy, WorldTransform,
};

#[derive(Debug, Clone)]
struct AssetRecord {
    handle: u64,
    kind: ObjectType,
    materials: Vec<MaterialBinding>,
}

#[derive(Debug, Clone)]
struct ActorRecord {
    asset_path: String,
    transform: WorldTransform,
}

#[derive(Debug, Default)]
struct WorldState {
    next_id: u64,
    // Asset records keyed by extension-free library path.
    assets: BTreeMap<String, AssetRecord>,
    paths_by_handle: BTreeMap<u64, String>,
    actors: BTreeMap<u64, ActorRecord>,
    selected_actors: Vec<u64>,
    selected_library: Vec<String>,
    holders: BTreeMap<u64, String>,
    registered: Vec<String>,
    library_view: Vec<String>,
}

impl WorldState {
    fn mint(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_asset(&mut self, path: &str, kind: ObjectType, materials: Vec<MaterialBinding>) -> u64 {
        let id = self.mint();
        self.assets.insert(
            path.to_string(),
            AssetRecord {
                handle: id,
                kind,
                materials,
            },
        );
        self.paths_by_handle.insert(id, path.to_string());
        id
    }
}

fn normalize(path: &str) -> String {
    strip_extension(path).to_string()
}

/// Object-style path the editor reports: the library path with the asset
/// name repeated as an extension.
fn object_path_of(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    format!("{path}.{name}")
}

/// In-memory editor world implementing every bridge capability.
pub struct MemoryHost {
    world: Rc<RefCell<WorldState>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            world: Rc::new(RefCell::new(WorldState::default())),
        }
    }

    /// Codec sharing this host's world.
    pub fn codec(&self) -> MemoryCodec {
        MemoryCodec {
            world: Rc::clone(&self.world),
            fail_exports: HashSet::new(),
            fail_imports: HashSet::new(),
            exported: Vec::new(),
        }
    }

    /// Create a static mesh with `(slot_name, material_path)` bindings;
    /// bound materials are created on demand.
    pub fn create_static_mesh(&mut self, path: &str, materials: &[(&str, &str)]) -> AssetHandle {
        let path = normalize(path);
        let bindings: Vec<MaterialBinding> = materials
            .iter()
            .enumerate()
            .map(|(i, (slot, mat))| MaterialBinding {
                slot_name: slot.to_string(),
                index: i as u32,
                material_path: object_path_of(&normalize(mat)),
            })
            .collect();
        let mut world = self.world.borrow_mut();
        for (_, mat) in materials {
            let mat = normalize(mat);
            if !world.assets.contains_key(&mat) {
                world.insert_asset(&mat, ObjectType::Unknown, Vec::new());
            }
        }
        AssetHandle(world.insert_asset(&path, ObjectType::StaticMesh, bindings))
    }

    pub fn create_skeletal_mesh(&mut self, path: &str) -> AssetHandle {
        let path = normalize(path);
        let mut world = self.world.borrow_mut();
        AssetHandle(world.insert_asset(&path, ObjectType::SkeletalMesh, Vec::new()))
    }

    /// Create a non-mesh asset (a material, a blueprint, ...).
    pub fn create_asset(&mut self, path: &str) -> AssetHandle {
        let path = normalize(path);
        let mut world = self.world.borrow_mut();
        AssetHandle(world.insert_asset(&path, ObjectType::Unknown, Vec::new()))
    }

    pub fn spawn_actor(&mut self, asset_path: &str) -> ActorId {
        self.spawn_actor_at(asset_path, WorldTransform::default())
    }

    pub fn spawn_actor_at(&mut self, asset_path: &str, transform: WorldTransform) -> ActorId {
        let mut world = self.world.borrow_mut();
        let id = world.mint();
        world.actors.insert(
            id,
            ActorRecord {
                asset_path: normalize(asset_path),
                transform,
            },
        );
        ActorId(id)
    }

    pub fn select_actors(&mut self, ids: &[ActorId]) {
        self.world.borrow_mut().selected_actors = ids.iter().map(|a| a.0).collect();
    }

    pub fn select_library(&mut self, paths: &[&str]) {
        self.world.borrow_mut().selected_library = paths.iter().map(|p| normalize(p)).collect();
    }

    /// Create an object holding a reference to `target_path`.
    pub fn add_reference(&mut self, target_path: &str) -> ReferenceHolder {
        let mut world = self.world.borrow_mut();
        let id = world.mint();
        world.holders.insert(id, normalize(target_path));
        ReferenceHolder(id)
    }

    pub fn asset_at(&self, path: &str) -> Option<ModelRef> {
        self.load_by_path(path)
    }

    pub fn asset_count(&self) -> usize {
        self.world.borrow().assets.len()
    }

    pub fn actor_asset(&self, id: ActorId) -> Option<String> {
        self.world.borrow().actors.get(&id.0).map(|a| a.asset_path.clone())
    }

    pub fn reference_target(&self, holder: ReferenceHolder) -> Option<String> {
        self.world.borrow().holders.get(&holder.0).cloned()
    }

    pub fn registered_paths(&self) -> Vec<String> {
        self.world.borrow().registered.clone()
    }

    pub fn library_view(&self) -> Vec<String> {
        self.world.borrow().library_view.clone()
    }

    pub fn materials_of(&self, path: &str) -> Vec<MaterialBinding> {
        let world = self.world.borrow();
        world
            .assets
            .get(&normalize(path))
            .map(|a| a.materials.clone())
            .unwrap_or_default()
    }
}

impl AssetStore for MemoryHost {
    fn duplicate(&mut self, source_path: &str, dest_path: &str) -> Result<ModelRef> {
        let source = normalize(source_path);
        let dest = normalize(dest_path);
        let mut world = self.world.borrow_mut();
        let record = world
            .assets
            .get(&source)
            .with_context(|| format!("no asset exists at '{source}'"))?
            .clone();
        if world.assets.contains_key(&dest) {
            bail!("an asset already exists at '{dest}'");
        }
        let id = world.insert_asset(&dest, record.kind, record.materials);
        Ok(ModelRef::from_kind(record.kind, AssetHandle(id)))
    }

    fn exists_at_path(&self, path: &str) -> bool {
        self.world.borrow().assets.contains_key(&normalize(path))
    }

    fn rename(&mut self, handle: AssetHandle, new_parent: &str, new_name: &str) -> Result<()> {
        let mut world = self.world.borrow_mut();
        let old_path = world
            .paths_by_handle
            .get(&handle.0)
            .with_context(|| format!("unknown asset handle {}", handle.0))?
            .clone();
        let new_path = format!("{}/{}", new_parent.trim_end_matches('/'), new_name);
        if world.assets.contains_key(&new_path) {
            bail!("cannot rename '{old_path}': '{new_path}' is already taken");
        }
        let record = world.assets.remove(&old_path).context("asset record vanished")?;
        world.assets.insert(new_path.clone(), record);
        world.paths_by_handle.insert(handle.0, new_path);
        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut world = self.world.borrow_mut();
        let record = world
            .assets
            .remove(&path)
            .with_context(|| format!("no asset to delete at '{path}'"))?;
        world.paths_by_handle.remove(&record.handle);
        Ok(())
    }

    fn load_by_path(&self, path: &str) -> Option<ModelRef> {
        let world = self.world.borrow();
        world
            .assets
            .get(&normalize(path))
            .map(|record| ModelRef::from_kind(record.kind, AssetHandle(record.handle)))
    }

    fn material_bindings(&self, handle: AssetHandle) -> Vec<MaterialBinding> {
        let world = self.world.borrow();
        world
            .paths_by_handle
            .get(&handle.0)
            .and_then(|path| world.assets.get(path))
            .map(|record| record.materials.clone())
            .unwrap_or_default()
    }

    fn rebind_material(&mut self, mesh: AssetHandle, slot_index: u32, material_path: &str) -> Result<()> {
        let mut world = self.world.borrow_mut();
        let path = world
            .paths_by_handle
            .get(&mesh.0)
            .with_context(|| format!("unknown asset handle {}", mesh.0))?
            .clone();
        let record = world.assets.get_mut(&path).context("asset record vanished")?;
        let slot = record
            .materials
            .iter_mut()
            .find(|m| m.index == slot_index)
            .with_context(|| format!("mesh '{path}' has no material slot {slot_index}"))?;
        slot.material_path = material_path.to_string();
        Ok(())
    }

    fn register(&mut self, handle: AssetHandle) -> Result<()> {
        let mut world = self.world.borrow_mut();
        let path = world
            .paths_by_handle
            .get(&handle.0)
            .with_context(|| format!("cannot register unknown handle {}", handle.0))?
            .clone();
        world.registered.push(path);
        Ok(())
    }

    fn selected_library_assets(&self) -> Vec<AssetDescriptor> {
        let world = self.world.borrow();
        world
            .selected_library
            .iter()
            .filter_map(|path| {
                world.assets.get(path).map(|record| AssetDescriptor {
                    model: ModelRef::from_kind(record.kind, AssetHandle(record.handle)),
                    object_path: object_path_of(path),
                })
            })
            .collect()
    }

    fn sync_library_view(&mut self, paths: &[String]) {
        self.world.borrow_mut().library_view = paths.to_vec();
    }
}

impl SceneHost for MemoryHost {
    fn selected_actors(&self) -> Vec<SceneActor> {
        let world = self.world.borrow();
        world
            .selected_actors
            .iter()
            .filter_map(|id| world.actors.get(id).map(|actor| (id, actor)))
            .map(|(id, actor)| {
                let meshes = world
                    .assets
                    .get(&actor.asset_path)
                    .filter(|record| {
                        matches!(record.kind, ObjectType::StaticMesh | ObjectType::SkeletalMesh)
                    })
                    .map(|record| {
                        vec![AssetDescriptor {
                            model: ModelRef::from_kind(record.kind, AssetHandle(record.handle)),
                            object_path: object_path_of(&actor.asset_path),
                        }]
                    })
                    .unwrap_or_default();
                SceneActor {
                    id: ActorId(*id),
                    transform: actor.transform,
                    meshes,
                }
            })
            .collect()
    }

    fn replace_actor_asset(&mut self, actor: ActorId, asset_path: &str) -> Result<()> {
        let mut world = self.world.borrow_mut();
        let record = world
            .actors
            .get_mut(&actor.0)
            .with_context(|| format!("unknown actor {}", actor.0))?;
        record.asset_path = normalize(asset_path);
        Ok(())
    }

    fn resolve_factory(&self, asset: &AssetDescriptor) -> Option<SpawnStrategy> {
        let name = asset.object_path.rsplit('/').next().unwrap_or("");
        if name.contains("Blueprint") || name.starts_with("BP_") {
            return Some(SpawnStrategy::Blueprint);
        }
        match asset.model.kind() {
            ObjectType::StaticMesh => Some(SpawnStrategy::Generic("StaticMeshActorFactory".to_string())),
            ObjectType::SkeletalMesh => {
                Some(SpawnStrategy::Generic("SkeletalMeshActorFactory".to_string()))
            }
            ObjectType::Unknown => None,
        }
    }

    fn replace_selected_actors(&mut self, _strategy: &SpawnStrategy, asset: &AssetDescriptor) -> Result<()> {
        let target = normalize(&asset.object_path);
        let mut world = self.world.borrow_mut();
        let selected = world.selected_actors.clone();
        for id in selected {
            if let Some(record) = world.actors.get_mut(&id) {
                record.asset_path = target.clone();
            }
        }
        Ok(())
    }
}

impl ReferenceIndex for MemoryHost {
    fn find_references_to(&self, path: &str) -> Vec<ReferenceHolder> {
        let target = normalize(path);
        let world = self.world.borrow();
        world
            .holders
            .iter()
            .filter(|(_, held)| **held == target)
            .map(|(id, _)| ReferenceHolder(*id))
            .collect()
    }

    fn rebind(&mut self, holder: ReferenceHolder, new_path: &str) -> Result<()> {
        let mut world = self.world.borrow_mut();
        let entry = world
            .holders
            .get_mut(&holder.0)
            .with_context(|| format!("unknown reference holder {}", holder.0))?;
        *entry = normalize(new_path);
        Ok(())
    }
}

/// Placeholder interchange codec writing one small JSON document per mesh,
/// with per-asset failure injection for batch-policy tests.
pub struct MemoryCodec {
    world: Rc<RefCell<WorldState>>,
    fail_exports: HashSet<String>,
    fail_imports: HashSet<String>,
    exported: Vec<PathBuf>,
}

impl MemoryCodec {
    /// Make the next export of the named asset fail.
    pub fn fail_export_of(&mut self, short_name: &str) {
        self.fail_exports.insert(short_name.to_string());
    }

    /// Make the next import of the named asset fail.
    pub fn fail_import_of(&mut self, short_name: &str) {
        self.fail_imports.insert(short_name.to_string());
    }

    /// Files written by this codec, in write order.
    pub fn exported_files(&self) -> &[PathBuf] {
        &self.exported
    }

    fn write_document(
        &mut self,
        mesh: AssetHandle,
        kind: ObjectType,
        materials: &[MaterialBinding],
        dest: &Path,
    ) -> Result<()> {
        let path = {
            let world = self.world.borrow();
            world
                .paths_by_handle
                .get(&mesh.0)
                .with_context(|| format!("unknown mesh handle {}", mesh.0))?
                .clone()
        };
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        if self.fail_exports.contains(&name) {
            bail!("codec refused to serialize '{name}'");
        }
        let document = serde_json::json!({
            "asset": name,
            "type": kind.as_str(),
            "materials": materials.iter().map(|m| m.slot_name.as_str()).collect::<Vec<_>>(),
        });
        let payload = serde_json::to_vec_pretty(&document).context("encode interchange document")?;
        std::fs::write(dest, payload)
            .with_context(|| format!("write interchange file '{}'", dest.display()))?;
        self.exported.push(dest.to_path_buf());
        Ok(())
    }
}

impl MeshCodec for MemoryCodec {
    fn file_extension(&self) -> &'static str {
        "fbx"
    }

    fn export_static_mesh(
        &mut self,
        mesh: AssetHandle,
        materials: &[MaterialBinding],
        dest: &Path,
    ) -> Result<()> {
        self.write_document(mesh, ObjectType::StaticMesh, materials, dest)
    }

    fn export_skeletal_mesh(&mut self, mesh: AssetHandle, dest: &Path) -> Result<()> {
        self.write_document(mesh, ObjectType::SkeletalMesh, &[], dest)
    }

    fn import_file(&mut self, source: &Path, dest_package_path: &str, asset_name: &str) -> Result<ModelRef> {
        if self.fail_imports.contains(asset_name) {
            bail!("codec cannot parse '{}'", source.display());
        }
        let content = std::fs::read_to_string(source)
            .with_context(|| format!("cannot open interchange file '{}'", source.display()))?;
        let document: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("malformed interchange file '{}'", source.display()))?;
        let kind = match document.get("type").and_then(|t| t.as_str()) {
            Some("SkeletalMesh") => ObjectType::SkeletalMesh,
            _ => ObjectType::StaticMesh,
        };

        let dest = format!("{}/{}", dest_package_path.trim_end_matches('/'), asset_name);
        let mut world = self.world.borrow_mut();
        if world.assets.contains_key(&dest) {
            bail!("an asset already exists at '{dest}'");
        }
        let id = world.insert_asset(&dest, kind, Vec::new());
        Ok(ModelRef::from_kind(kind, AssetHandle(id)))
    }
}
