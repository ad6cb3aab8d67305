//! Error model for the bridge core.
//!
//! Host API failures are caught at the point of call and converted into
//! these kinds; nothing from the host crosses the core boundary as a panic.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::manifest::ManifestError;

/// Errors that can occur during bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Assets Bridge settings are not configured: {0} is empty, please configure settings")]
    SettingsNotConfigured(&'static str),

    #[error("{0}")]
    NoSelection(String),

    #[error("You must select at least 1 item in the level")]
    EmptySceneSelection,

    #[error("You must select at least 1 from the content browser to replace the selected items with")]
    EmptyLibrarySelection,

    #[error("duplication failed: {0}")]
    DuplicateConflict(String),

    #[error("failed to create export directory '{}': {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("codec failure for '{asset}': {message}")]
    Codec { asset: String, message: String },

    #[error("failed to retire existing asset at '{path}': {message}")]
    ReferenceReplace { path: String, message: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("host call failed: {0}")]
    Host(String),
}

impl BridgeError {
    /// Wrap an arbitrary host-side failure.
    pub fn host(err: impl std::fmt::Display) -> Self {
        BridgeError::Host(err.to_string())
    }
}
