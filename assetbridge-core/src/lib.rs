//! # Assets Bridge Core
//!
//! Engine for an editor-integrated content bridge: select meshes in the
//! scene or the content library, export them to interchange files plus a
//! JSON manifest, edit them in an external 3D tool, then re-import the
//! modified files and re-wire every existing reference to the replacement.
//!
//! ## Architecture
//!
//! The core never talks to the editor directly. Everything it needs is
//! behind a small set of capability traits in [`host`]:
//!
//! - **`AssetStore`**: duplicate, rename, delete, look up and publish
//!   assets in the content library
//! - **`MeshCodec`**: write meshes to interchange files and materialize
//!   meshes back from them
//! - **`SceneHost`**: scene selection and actor replacement
//! - **`ReferenceIndex`**: find and re-point reference holders
//!
//! On top of those sit the workers: [`selection::SelectionResolver`]
//! normalizes the two selection sources, [`duplicate::DuplicationGuard`]
//! copies read-only content into the user library before it is touched,
//! [`export::ExportOrchestrator`] writes interchange files and the
//! manifest, and [`import::ImportOrchestrator`] replays the manifest back,
//! retiring anything already occupying a destination. The
//! [`bridge::BridgeManager`] façade sequences them.
//!
//! All operations are synchronous and run on the caller's thread; the only
//! persisted artifact is the manifest at the export root.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use assetbridge_core::{BridgeConfig, BridgeManager};
//! use assetbridge_core::host::memory::MemoryHost;
//!
//! let mut config = BridgeConfig::default();
//! config.library_root = "/projects/demo/Content".to_string();
//! config.export_root = "/projects/demo/Bridge".to_string();
//!
//! let mut host = MemoryHost::new();
//! let mut codec = host.codec();
//! let manager = BridgeManager::new(config);
//!
//! let report = match manager.start_export(&mut host, &mut codec) {
//!     Ok(report) => report,
//!     Err(error) => assetbridge_core::OperationReport::failed(error.to_string()),
//! };
//! println!("{}", report.message);
//! ```

pub mod bridge;
pub mod config;
pub mod duplicate;
pub mod error;
pub mod export;
pub mod host;
pub mod import;
pub mod manifest;
pub mod paths;
pub mod selection;

// Re-export commonly used types
pub use bridge::{BridgeManager, OperationReport};
pub use config::BridgeConfig;
pub use duplicate::{DuplicationGuard, DuplicationResult};
pub use error::BridgeError;
pub use export::ExportOrchestrator;
pub use host::{
    ActorId, AssetDescriptor, AssetHandle, AssetStore, BridgeHost, MaterialBinding, MeshCodec,
    ModelRef, ReferenceHolder, ReferenceIndex, SceneActor, SceneHost, SpawnStrategy,
    WorldTransform,
};
pub use import::{ElementFailure, ImportOrchestrator, ImportPhase, ImportSummary, ImportedElement};
pub use manifest::{
    ExportElement, Manifest, ManifestError, ManifestStore, MaterialSlot, ObjectType,
    MANIFEST_FILE_NAME, OPERATION_EXPORT,
};
pub use paths::{sanitize_name, split_object_path, strip_extension, PathResolver};
pub use selection::{SelectionCandidate, SelectionResolver};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize structured logging for hosts that do not bring their own
/// subscriber.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assetbridge_core=info".into()),
        )
        .with_target(false)
        .try_init();
}
