//! Mesh file I/O.
//!
//! The unwrap pipeline works on in-memory [`Mesh`] values and never touches
//! files. This module is the loader the CLI uses around it.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Parsed with `tobj`; writes one `vt` per vertex |
//!
//! # Usage
//!
//! ```no_run
//! use chartwise::io::{load, save};
//! use chartwise::unwrap::{unwrap, UnwrapParams};
//!
//! let mesh = load("model.obj").unwrap();
//! let (unwrapped, _) = unwrap(&mesh, &UnwrapParams::default()).unwrap();
//! save(&unwrapped, "model_uv.obj").unwrap();
//! ```

pub mod obj;

use std::path::Path;

use crate::error::{Result, UnwrapError};
use crate::mesh::Mesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| UnwrapError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh, choosing the format from the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Obj => obj::load(path),
    }
}

/// Save a mesh, choosing the format from the file extension.
pub fn save<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Obj => obj::save(mesh, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/model.OBJ"), Some(Format::Obj));
        assert_eq!(Format::from_path("model.stl"), None);
        assert_eq!(Format::from_path("model"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        match load("model.fbx") {
            Err(UnwrapError::UnsupportedFormat { extension }) => assert_eq!(extension, "fbx"),
            other => panic!("unexpected {:?}", other.map(|m| m.num_faces())),
        }
    }
}
