//! Wavefront OBJ loading for scanned environments and prisms.
//!
//! Only vertex (`v`) and face (`f`) records are read; polygons are fan
//! triangulated and every other record is skipped.

use std::path::Path;

use vibrissa_collision::{CollisionGeometryLoadError, TriMesh};
use vibrissa_math::Vec3;

type Result<T> = std::result::Result<T, CollisionGeometryLoadError>;

/// Load an OBJ file as a triangle mesh (coordinates in mm).
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| CollisionGeometryLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_obj(&text)?;
    tracing::info!(
        path = %path.display(),
        vertices = mesh.vertices().len(),
        triangles = mesh.num_triangles(),
        "loaded mesh"
    );
    Ok(mesh)
}

pub fn parse_obj(text: &str) -> Result<TriMesh> {
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let mut fields = raw.split_whitespace();
        match fields.next() {
            Some("v") => {
                let coords = fields
                    .take(3)
                    .map(|f| f.parse::<f64>())
                    .collect::<std::result::Result<Vec<f64>, _>>()
                    .map_err(|e| parse_error(line, e.to_string()))?;
                if coords.len() != 3 {
                    return Err(parse_error(line, "vertex needs three coordinates".into()));
                }
                vertices.push(Vec3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let corners = fields
                    .map(|f| vertex_index(f, vertices.len(), line))
                    .collect::<Result<Vec<usize>>>()?;
                if corners.len() < 3 {
                    return Err(parse_error(line, "face needs at least three vertices".into()));
                }
                for k in 1..corners.len() - 1 {
                    faces.push([corners[0], corners[k], corners[k + 1]]);
                }
            }
            _ => {}
        }
    }

    TriMesh::new(vertices, faces)
}

/// Resolve one face corner (`i`, `i/t`, `i//n`, `i/t/n`; negative indices
/// count back from the latest vertex) to a zero-based index.
fn vertex_index(field: &str, seen: usize, line: usize) -> Result<usize> {
    let head = field.split('/').next().unwrap_or(field);
    let index: i64 = head
        .parse()
        .map_err(|_| parse_error(line, format!("bad face index `{field}`")))?;
    let resolved = if index > 0 {
        index - 1
    } else {
        seen as i64 + index
    };
    if index == 0 || resolved < 0 {
        return Err(parse_error(line, format!("face index {index} out of range")));
    }
    Ok(resolved as usize)
}

fn parse_error(line: usize, message: String) -> CollisionGeometryLoadError {
    CollisionGeometryLoadError::Parse { line, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE: &str = "\
# unit cube
o cube
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
vn 0 0 1
f 1 4 3 2
f 5 6 7 8
f 1 2 6 5
f 2/1 3/2 7/3 6/4
f 3//1 4//1 8//1 7//1
f -8 -4 -1 -5
";

    #[test]
    fn test_cube_is_fan_triangulated() {
        let mesh = parse_obj(CUBE).unwrap();
        assert_eq!(mesh.vertices().len(), 8);
        assert_eq!(mesh.num_triangles(), 12);
        let b = mesh.bounds();
        assert_eq!(b.min, Vec3::zeros());
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_bad_records() {
        assert!(matches!(
            parse_obj("v 0 0\n"),
            Err(CollisionGeometryLoadError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\n"),
            Err(CollisionGeometryLoadError::Parse { line: 3, .. })
        ));
        assert!(matches!(
            parse_obj("v 0 0 0\nf 0 1 1\n"),
            Err(CollisionGeometryLoadError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n"),
            Err(CollisionGeometryLoadError::FaceIndexOutOfRange { index: 8, .. })
        ));
        assert!(matches!(parse_obj("# nothing\n"), Err(CollisionGeometryLoadError::EmptyMesh)));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_obj("/nonexistent/drain_pipe.obj"),
            Err(CollisionGeometryLoadError::Io { .. })
        ));
    }
}
