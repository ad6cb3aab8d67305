//! Capabilities the core needs from the hosting editor.
//!
//! The bridge never touches the editor's object model directly. Meshes and
//! materials are opaque handles with a small set of queryable attributes;
//! everything that mutates the scene, the asset index, or the interchange
//! files goes through these traits. Host failures surface as
//! `anyhow::Error` and are converted to the typed error model at each call
//! site.

pub mod memory;

use anyhow::Result;
use std::path::Path;

use crate::manifest::ObjectType;

/// Opaque reference to an asset owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetHandle(pub u64);

/// Opaque reference to a placed scene actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId(pub u64);

/// Opaque reference to an object holding an asset reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceHolder(pub u64);

/// A model handle tagged with its kind, dispatched on by matching rather
/// than downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRef {
    StaticMesh(AssetHandle),
    SkeletalMesh(AssetHandle),
    Unknown(AssetHandle),
}

impl ModelRef {
    pub fn from_kind(kind: ObjectType, handle: AssetHandle) -> Self {
        match kind {
            ObjectType::StaticMesh => ModelRef::StaticMesh(handle),
            ObjectType::SkeletalMesh => ModelRef::SkeletalMesh(handle),
            ObjectType::Unknown => ModelRef::Unknown(handle),
        }
    }

    pub fn handle(&self) -> AssetHandle {
        match self {
            ModelRef::StaticMesh(h) | ModelRef::SkeletalMesh(h) | ModelRef::Unknown(h) => *h,
        }
    }

    pub fn kind(&self) -> ObjectType {
        match self {
            ModelRef::StaticMesh(_) => ObjectType::StaticMesh,
            ModelRef::SkeletalMesh(_) => ObjectType::SkeletalMesh,
            ModelRef::Unknown(_) => ObjectType::Unknown,
        }
    }
}

/// An asset as the host describes it: a tagged model plus its library path.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDescriptor {
    pub model: ModelRef,
    pub object_path: String,
}

/// One material slot binding on a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialBinding {
    /// Slot name, unique within the owning mesh
    pub slot_name: String,
    /// Position in the mesh's material array
    pub index: u32,
    /// Library path of the bound material
    pub material_path: String,
}

/// World placement of a scene instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub location: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            location: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

/// A selected actor together with the mesh assets it exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneActor {
    pub id: ActorId,
    pub transform: WorldTransform,
    pub meshes: Vec<AssetDescriptor>,
}

/// How the host should build an actor from a library asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnStrategy {
    /// The asset is a blueprint-like composite; use the host's dedicated
    /// blueprint factory
    Blueprint,
    /// Plain asset; named generic factory looked up by the host
    Generic(String),
}

/// Asset storage and indexing operations.
pub trait AssetStore {
    /// Copy the asset at `source_path` to `dest_path`, returning the new
    /// model. Fails when the destination already exists.
    fn duplicate(&mut self, source_path: &str, dest_path: &str) -> Result<ModelRef>;

    fn exists_at_path(&self, path: &str) -> bool;

    /// Move an asset (and its package) to a new parent directory and name.
    fn rename(&mut self, handle: AssetHandle, new_parent: &str, new_name: &str) -> Result<()>;

    /// Remove the asset at `path` from the index.
    fn delete(&mut self, path: &str) -> Result<()>;

    fn load_by_path(&self, path: &str) -> Option<ModelRef>;

    /// Material slots of a mesh, in slot-array order.
    fn material_bindings(&self, handle: AssetHandle) -> Vec<MaterialBinding>;

    /// Point one slot of a mesh at a different material.
    fn rebind_material(&mut self, mesh: AssetHandle, slot_index: u32, material_path: &str) -> Result<()>;

    /// Publish a newly created asset to the asset index.
    fn register(&mut self, handle: AssetHandle) -> Result<()>;

    /// Assets currently selected in the content library view.
    fn selected_library_assets(&self) -> Vec<AssetDescriptor>;

    /// Re-sync the content library view to show the given paths.
    fn sync_library_view(&mut self, paths: &[String]);
}

/// Scene interaction: selection, and actor replacement.
pub trait SceneHost {
    /// Actors currently selected in the scene. Actors without any mesh
    /// component come back with an empty `meshes` list.
    fn selected_actors(&self) -> Vec<SceneActor>;

    /// Re-point one actor at a different library asset, keeping its
    /// placement.
    fn replace_actor_asset(&mut self, actor: ActorId, asset_path: &str) -> Result<()>;

    /// Find a creation strategy for the asset, or `None` when no factory
    /// can build an actor from it.
    fn resolve_factory(&self, asset: &AssetDescriptor) -> Option<SpawnStrategy>;

    /// Replace every selected actor with an instance built from `asset`.
    fn replace_selected_actors(&mut self, strategy: &SpawnStrategy, asset: &AssetDescriptor) -> Result<()>;
}

/// Explicit view of the host's reference graph, replacing a live walk over
/// loaded objects.
pub trait ReferenceIndex {
    /// Objects currently holding a reference to the asset at `path`.
    fn find_references_to(&self, path: &str) -> Vec<ReferenceHolder>;

    /// Re-point one holder at a different asset path.
    fn rebind(&mut self, holder: ReferenceHolder, new_path: &str) -> Result<()>;
}

/// Everything the bridge needs from the editor in one place.
pub trait BridgeHost: AssetStore + SceneHost + ReferenceIndex {}

impl<T: AssetStore + SceneHost + ReferenceIndex> BridgeHost for T {}

/// Interchange codec supplied by the host. One codec document is opened,
/// populated, written, and closed per mesh; meshes are never batched into a
/// single session.
pub trait MeshCodec {
    /// Extension of the interchange files this codec produces, without the
    /// dot.
    fn file_extension(&self) -> &'static str;

    /// Write a static mesh and its captured material slots to `dest`.
    fn export_static_mesh(
        &mut self,
        mesh: AssetHandle,
        materials: &[MaterialBinding],
        dest: &Path,
    ) -> Result<()>;

    /// Write a skeletal mesh to `dest`.
    fn export_skeletal_mesh(&mut self, mesh: AssetHandle, dest: &Path) -> Result<()>;

    /// Materialize a new mesh object from an interchange file at the given
    /// package path and name.
    fn import_file(&mut self, source: &Path, dest_package_path: &str, asset_name: &str) -> Result<ModelRef>;
}
