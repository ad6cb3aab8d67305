//! The export manifest: the one artifact this core persists.
//!
//! A manifest records what was exported and where, in insertion order, and
//! is consumed by the importer after the external tool has modified the
//! interchange files. Field names and nesting in the JSON document are a
//! wire contract with external tools and must not drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Fixed manifest file name, located at the export root.
pub const MANIFEST_FILE_NAME: &str = "AssetBridge.json";

/// Operation tag stamped by the exporter.
pub const OPERATION_EXPORT: &str = "BridgeExport";

/// Operation tags the importer understands.
const SUPPORTED_OPERATIONS: &[&str] = &[OPERATION_EXPORT];

/// Errors reading or writing the manifest document
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to open manifest for reading: '{}'", .path.display())]
    NotFound { path: PathBuf },

    #[error("unable to access manifest '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest detected in file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("manifest operation '{operation}' is not supported by this importer")]
    UnsupportedOperation { operation: String },
}

/// Kind of exported object, dispatched on instead of downcasting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    StaticMesh,
    SkeletalMesh,
    Unknown,
}

impl ObjectType {
    /// Static display name, no reflection involved.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::StaticMesh => "StaticMesh",
            ObjectType::SkeletalMesh => "SkeletalMesh",
            ObjectType::Unknown => "Unknown",
        }
    }

    /// Parse a wire tag; anything unrecognized maps to `Unknown` so a
    /// manifest written by a newer tool still reads.
    pub fn from_str_lossy(tag: &str) -> Self {
        match tag {
            "StaticMesh" => ObjectType::StaticMesh,
            "SkeletalMesh" => ObjectType::SkeletalMesh,
            _ => ObjectType::Unknown,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ObjectType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ObjectType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(ObjectType::from_str_lossy(&tag))
    }
}

/// One material slot captured at export time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSlot {
    /// Slot name, unique within the owning mesh
    #[serde(rename = "Name")]
    pub name: String,

    /// Position in the mesh's material array
    #[serde(rename = "Idx")]
    pub index: u32,

    /// Library path of the bound material, extension stripped
    #[serde(rename = "InternalPath")]
    pub internal_path: String,
}

/// One exported object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportElement {
    /// File-system-safe base name of the exported file
    #[serde(rename = "ShortName")]
    pub short_name: String,

    /// Library-relative directory, `/`-rooted, without the library mount
    #[serde(rename = "InternalPath")]
    pub internal_path: String,

    /// Where the interchange file was written
    #[serde(rename = "ExportLocation")]
    pub export_location: String,

    /// Kind of the exported object
    #[serde(rename = "ObjectType")]
    pub object_type: ObjectType,

    /// Material slots captured when the object was exported
    #[serde(rename = "ObjectMaterials", default)]
    pub materials: Vec<MaterialSlot>,
}

/// The manifest document; element order is insertion order and determines
/// re-import order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Tag identifying the manifest's intent, checked by the importer
    #[serde(rename = "Operation")]
    pub operation: String,

    /// Exported objects, in export order
    #[serde(rename = "Objects")]
    pub objects: Vec<ExportElement>,
}

impl Manifest {
    /// New empty manifest carrying the exporter's operation tag.
    pub fn for_export() -> Self {
        Self {
            operation: OPERATION_EXPORT.to_string(),
            objects: Vec::new(),
        }
    }

    /// Reject manifests whose operation tag this importer does not
    /// understand.
    pub fn ensure_supported_operation(&self) -> Result<(), ManifestError> {
        if SUPPORTED_OPERATIONS.contains(&self.operation.as_str()) {
            return Ok(());
        }
        Err(ManifestError::UnsupportedOperation {
            operation: self.operation.clone(),
        })
    }
}

/// Reads and writes the manifest document on disk.
pub struct ManifestStore;

impl ManifestStore {
    /// Serialize a manifest to `path`, creating parent directories and
    /// replacing any previous file. The document is written to a temporary
    /// file in the destination directory and renamed into place, so a
    /// concurrent reader never observes a partial manifest.
    pub fn write(manifest: &Manifest, path: &Path) -> Result<(), ManifestError> {
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|source| ManifestError::Io {
            path: parent.clone(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&parent).map_err(|source| ManifestError::Io {
            path: parent.clone(),
            source,
        })?;
        serde_json::to_writer_pretty(&mut tmp, manifest).map_err(ManifestError::Serialize)?;
        tmp.persist(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }

    /// Read a manifest back from `path`.
    pub fn read(path: &Path) -> Result<Manifest, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_manifest() -> Manifest {
        Manifest {
            operation: OPERATION_EXPORT.to_string(),
            objects: vec![
                ExportElement {
                    short_name: "Barrel".to_string(),
                    internal_path: "/Props".to_string(),
                    export_location: "C:/Export/Props/Barrel.fbx".to_string(),
                    object_type: ObjectType::StaticMesh,
                    materials: vec![
                        MaterialSlot {
                            name: "Mat_0".to_string(),
                            index: 0,
                            internal_path: "/Materials/M_Barrel".to_string(),
                        },
                        MaterialSlot {
                            name: "Mat_1".to_string(),
                            index: 1,
                            internal_path: "/Materials/M_Rust".to_string(),
                        },
                    ],
                },
                ExportElement {
                    short_name: "Guard".to_string(),
                    internal_path: "/Characters".to_string(),
                    export_location: "C:/Export/Characters/Guard.fbx".to_string(),
                    object_type: ObjectType::SkeletalMesh,
                    materials: vec![],
                },
            ],
        }
    }

    #[test]
    fn round_trips_with_order_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);

        let manifest = sample_manifest();
        ManifestStore::write(&manifest, &path).unwrap();
        let read_back = ManifestStore::read(&path).unwrap();

        assert_eq!(read_back, manifest);
        assert_eq!(read_back.objects[0].materials[0].name, "Mat_0");
        assert_eq!(read_back.objects[0].materials[1].name, "Mat_1");
    }

    #[test]
    fn write_creates_parent_directories_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join(MANIFEST_FILE_NAME);

        let mut manifest = sample_manifest();
        ManifestStore::write(&manifest, &path).unwrap();

        manifest.objects.truncate(1);
        ManifestStore::write(&manifest, &path).unwrap();

        let read_back = ManifestStore::read(&path).unwrap();
        assert_eq!(read_back.objects.len(), 1);
    }

    #[test]
    fn wire_field_names_are_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);
        ManifestStore::write(&sample_manifest(), &path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get("Operation").is_some());
        let objects = raw.get("Objects").unwrap().as_array().unwrap();
        let first = &objects[0];
        for key in ["ShortName", "InternalPath", "ExportLocation", "ObjectType", "ObjectMaterials"] {
            assert!(first.get(key).is_some(), "missing wire field {key}");
        }
        let slot = &first["ObjectMaterials"][0];
        for key in ["Name", "Idx", "InternalPath"] {
            assert!(slot.get(key).is_some(), "missing wire field {key}");
        }
        assert_eq!(first["ObjectType"], "StaticMesh");
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = ManifestStore::read(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[test]
    fn read_rejects_documents_missing_required_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");

        std::fs::write(&path, r#"{"Objects": []}"#).unwrap();
        assert!(matches!(
            ManifestStore::read(&path).unwrap_err(),
            ManifestError::Parse { .. }
        ));

        std::fs::write(&path, r#"{"Operation": "BridgeExport"}"#).unwrap();
        assert!(matches!(
            ManifestStore::read(&path).unwrap_err(),
            ManifestError::Parse { .. }
        ));

        std::fs::write(&path, "not json at all").unwrap();
        assert!(matches!(
            ManifestStore::read(&path).unwrap_err(),
            ManifestError::Parse { .. }
        ));
    }

    #[test]
    fn unknown_object_types_map_to_unknown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.json");
        std::fs::write(
            &path,
            r#"{"Operation":"BridgeExport","Objects":[{"ShortName":"Cloth","InternalPath":"/Props","ExportLocation":"/tmp/Cloth.fbx","ObjectType":"ClothMesh","ObjectMaterials":[]}]}"#,
        )
        .unwrap();

        let manifest = ManifestStore::read(&path).unwrap();
        assert_eq!(manifest.objects[0].object_type, ObjectType::Unknown);
    }

    #[test]
    fn operation_gate_rejects_foreign_tags() {
        let manifest = Manifest {
            operation: "SomethingElse".to_string(),
            objects: vec![],
        };
        assert!(matches!(
            manifest.ensure_supported_operation(),
            Err(ManifestError::UnsupportedOperation { .. })
        ));
        assert!(Manifest::for_export().ensure_supported_operation().is_ok());
    }
}
