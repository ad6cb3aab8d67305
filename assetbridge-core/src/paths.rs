//! Path classification and mapping between library paths and disk paths.
//!
//! Library paths are `/`-separated and rooted at a virtual mount (for
//! example `/Game/Props/Barrel.Barrel`). The resolver strips view markers
//! and the mount before joining onto a configured disk root, classifies
//! paths as system-owned, and computes the inverse mapping used when a
//! modified interchange file comes back into the library.

use std::path::{Path, PathBuf};

use crate::config::BridgeConfig;

/// Path mapping over a borrowed configuration.
pub struct PathResolver<'a> {
    config: &'a BridgeConfig,
}

impl<'a> PathResolver<'a> {
    pub fn new(config: &'a BridgeConfig) -> Self {
        Self { config }
    }

    /// True when the path sits under a protected (read-only) prefix.
    ///
    /// Matches on segment boundaries: `/EngineExtras/Foo` is not under
    /// `/Engine`.
    pub fn is_system_path(&self, path: &str) -> bool {
        self.config
            .protected_prefixes
            .iter()
            .any(|prefix| starts_with_segment(path, prefix))
    }

    /// Remove leading virtual-root markers (the content browser "show all"
    /// marker and the library mount) from the front of a library path.
    pub fn strip_virtual_roots<'p>(&self, path: &'p str) -> &'p str {
        let mut out = path;
        for root in &self.config.virtual_roots {
            if let Some(rest) = strip_prefix_segment(out, root) {
                out = rest;
            }
        }
        out
    }

    /// Map a library directory to the on-disk export location of one file.
    pub fn to_external_path(&self, export_root: &Path, internal_dir: &str, file_name: &str) -> PathBuf {
        let rel = self.strip_virtual_roots(internal_dir);
        let rel = rel.trim_start_matches('/');
        if rel.is_empty() {
            export_root.join(file_name)
        } else {
            export_root.join(rel).join(file_name)
        }
    }

    /// Inverse mapping: join a manifest-relative directory and asset name
    /// under the library mount, producing a destination that is never
    /// system-owned.
    ///
    /// A directory still carrying a protected prefix sheds it first, and
    /// when the joined path afterwards classifies as system the leading
    /// relative segment is dropped and the join retried, so content aimed
    /// at a read-only area lands in the nearest writable spot instead.
    pub fn rehome_to_library(&self, internal_dir: &str, name: &str) -> String {
        let mut dir = internal_dir;
        for prefix in &self.config.protected_prefixes {
            if let Some(rest) = strip_prefix_segment(dir, prefix) {
                dir = rest;
                break;
            }
        }
        let stripped = self.strip_virtual_roots(dir);
        let mut segments: Vec<&str> = stripped.split('/').filter(|s| !s.is_empty()).collect();
        loop {
            let mut candidate = self.config.library_mount.clone();
            for segment in &segments {
                candidate.push('/');
                candidate.push_str(segment);
            }
            candidate.push('/');
            candidate.push_str(name);

            if !self.is_system_path(&candidate) {
                return candidate;
            }
            if segments.is_empty() {
                // A bare name can still collide with a protected prefix;
                // park it under a writable folder.
                return format!("{}/Imported/{}", self.config.library_mount, name);
            }
            segments.remove(0);
        }
    }
}

/// Return the path up to (not including) the last `.` of the final
/// segment. A path without a dot comes back unchanged, so callers cannot
/// detect extensions through this function alone.
pub fn strip_extension(path: &str) -> &str {
    let file_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[file_start..].rfind('.') {
        Some(dot) => &path[..file_start + dot],
        None => path,
    }
}

/// Split a library object path into its directory and extension-free name,
/// mirroring the host's path-split helper.
pub fn split_object_path(path: &str) -> (&str, &str) {
    let (dir, file) = match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    };
    let name = match file.rfind('.') {
        Some(dot) => &file[..dot],
        None => file,
    };
    (dir, name)
}

/// Replace characters the host will not accept in an asset name.
pub fn sanitize_name(name: &str) -> String {
    if name.is_empty() {
        return "Unnamed".to_string();
    }
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn starts_with_segment(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn strip_prefix_segment<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => Some(rest),
        _ => None,
    }
}
