//! Wavefront OBJ format support.
//!
//! Parsing is done by `tobj`. Only geometry is kept: texture coordinates
//! and normals in the input are ignored, since the pipeline computes its
//! own UVs. Saving writes one `vt` per vertex when the mesh carries UVs, so
//! every face corner uses the same index for position and texture
//! coordinate.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use nalgebra::Point3;

use crate::error::{Result, UnwrapError};
use crate::mesh::Mesh;

/// Load a mesh from an OBJ file.
///
/// Polygons are fan-triangulated. Face tokens may be `v`, `v/vt`, `v//vn`
/// or `v/vt/vn`, and indices may be negative. All objects and groups in
/// the file are merged into one mesh.
///
/// # Example
///
/// ```no_run
/// use chartwise::io::obj;
///
/// let mesh = obj::load("model.obj").unwrap();
/// println!("{} faces", mesh.num_faces());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_from(&mut BufReader::new(file), path)
}

/// Parse OBJ text from a reader.
pub fn read<R: BufRead>(mut reader: R) -> Result<Mesh> {
    read_from(&mut reader, Path::new("(stream)"))
}

fn read_from<R: BufRead>(reader: &mut R, path: &Path) -> Result<Mesh> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ..Default::default()
    };
    // Materials are irrelevant here; never open .mtl files
    let (models, _materials) = tobj::load_obj_buf(reader, &options, |_| Ok(Default::default()))
        .map_err(|e| load_error(path, e.to_string()))?;

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::new();

    for model in &models {
        let obj_mesh = &model.mesh;
        let offset = positions.len();

        positions.extend(
            obj_mesh
                .positions
                .chunks_exact(3)
                .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64)),
        );
        triangles.extend(obj_mesh.indices.chunks_exact(3).map(|c| {
            [
                c[0] as usize + offset,
                c[1] as usize + offset,
                c[2] as usize + offset,
            ]
        }));
    }

    if triangles.is_empty() {
        return Err(load_error(path, "OBJ file contains no faces".to_string()));
    }

    log::debug!(
        "OBJ loaded: {} vertices, {} triangles from {} models",
        positions.len(),
        triangles.len(),
        models.len()
    );

    Ok(Mesh::new(positions, triangles))
}

fn load_error(path: &Path, message: String) -> UnwrapError {
    UnwrapError::LoadError {
        path: PathBuf::from(path),
        message,
    }
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use chartwise::io::obj;
/// use chartwise::mesh::primitives;
///
/// obj::save(&primitives::cube(), "cube.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer).map_err(|e| match e {
        UnwrapError::Io(io) => UnwrapError::SaveError {
            path: path.to_path_buf(),
            message: io.to_string(),
        },
        other => other,
    })?;
    writer.flush()?;
    log::debug!("OBJ saved: {}", path.display());
    Ok(())
}

/// Write a mesh as OBJ text.
pub fn write<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    writeln!(writer, "# chartwise")?;
    writeln!(writer, "# Vertices: {}", mesh.num_vertices())?;
    writeln!(writer, "# Faces: {}", mesh.num_faces())?;
    for p in &mesh.positions {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    match &mesh.uvs {
        Some(uvs) => {
            for (_, uv) in uvs.iter() {
                writeln!(writer, "vt {} {}", uv.x, uv.y)?;
            }
            for t in &mesh.triangles {
                let [a, b, c] = [t[0] + 1, t[1] + 1, t[2] + 1];
                writeln!(writer, "f {a}/{a} {b}/{b} {c}/{c}")?;
            }
        }
        None => {
            for t in &mesh.triangles {
                writeln!(writer, "f {} {} {}", t[0] + 1, t[1] + 1, t[2] + 1)?;
            }
        }
    }

    Ok(())
}
