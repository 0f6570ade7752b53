use std::collections::hash_map::Entry;
use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while decoding an OBJ mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("mesh defines no vertices")]
    Empty,
    #[error("mesh defines no faces")]
    NoFaces,
    #[error("face references vertex {index} which is not defined")]
    IndexOutOfRange { index: i32 },
}

fn malformed(line: usize, message: String) -> MeshError {
    MeshError::Malformed { line, message }
}

/// Triangle mesh decoded from an OBJ file, laid out for the GPU.
///
/// Vertices interleave `position.xyz normal.xyz`; indices form a triangle
/// list. Corners sharing position and normal are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 6
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A face corner, as written in the file: one-based indices, zero meaning
/// the normal slot was left out.
#[derive(Debug, Clone, Copy)]
struct Corner {
    position: i32,
    normal: i32,
}

/// Decodes OBJ text into an indexed triangle mesh.
///
/// Handles `v`, `vn`, and `f` directives; texture coordinates and grouping
/// directives are skipped. Faces with more than three corners are fanned
/// into triangles. When the file carries no usable normals they are rebuilt
/// from face geometry.
pub fn decode_obj(text: &str) -> Result<MeshData, MeshError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut triangles: Vec<[Corner; 3]> = Vec::new();

    for (number, raw) in text.lines().enumerate() {
        let line = number + 1;
        let content = raw.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }
        let mut fields = content.split_whitespace();
        match fields.next() {
            Some("v") => positions.push(read_vec3(&mut fields, line)?),
            Some("vn") => normals.push(read_vec3(&mut fields, line)?),
            Some("f") => read_face(fields, line, &mut triangles)?,
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(MeshError::Empty);
    }
    if triangles.is_empty() {
        return Err(MeshError::NoFaces);
    }

    let mut mesh = assemble(&positions, &normals, &triangles)?;
    if has_missing_normals(&mesh) {
        generate_normals(&mut mesh);
    }
    Ok(mesh)
}

fn read_vec3<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vec3, MeshError> {
    let mut out = [0.0f32; 3];
    for (slot, axis) in out.iter_mut().zip(["x", "y", "z"]) {
        let field = fields
            .next()
            .ok_or_else(|| malformed(line, format!("missing {axis} component")))?;
        *slot = field
            .parse()
            .map_err(|err| malformed(line, format!("bad {axis} component: {err}")))?;
    }
    Ok(Vec3::from_array(out))
}

fn read_face<'a>(
    fields: impl Iterator<Item = &'a str>,
    line: usize,
    triangles: &mut Vec<[Corner; 3]>,
) -> Result<(), MeshError> {
    let mut corners = Vec::new();
    for field in fields {
        corners.push(read_corner(field, line)?);
    }
    if corners.len() < 3 {
        return Err(malformed(line, "faces need at least three corners".into()));
    }
    for i in 1..corners.len() - 1 {
        triangles.push([corners[0], corners[i], corners[i + 1]]);
    }
    Ok(())
}

fn read_corner(field: &str, line: usize) -> Result<Corner, MeshError> {
    let mut parts = field.split('/');
    let position = parts
        .next()
        .unwrap_or("")
        .parse::<i32>()
        .map_err(|err| malformed(line, format!("bad vertex index {field:?}: {err}")))?;
    let _texcoord = parts.next();
    let normal = parts
        .next()
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(0);
    Ok(Corner { position, normal })
}

fn assemble(
    positions: &[Vec3],
    normals: &[Vec3],
    triangles: &[[Corner; 3]],
) -> Result<MeshData, MeshError> {
    let mut seen: HashMap<(usize, Option<usize>), u32> = HashMap::new();
    let mut mesh = MeshData::default();

    for triangle in triangles {
        for corner in triangle {
            let position =
                resolve(corner.position, positions.len()).ok_or(MeshError::IndexOutOfRange {
                    index: corner.position,
                })?;
            let normal = resolve(corner.normal, normals.len());
            let index = match seen.entry((position, normal)) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let index = (mesh.vertices.len() / 6) as u32;
                    let p = positions[position];
                    let n = normal.map_or(Vec3::ZERO, |i| normals[i]);
                    mesh.vertices
                        .extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z]);
                    entry.insert(index);
                    index
                }
            };
            mesh.indices.push(index);
        }
    }
    Ok(mesh)
}

/// OBJ indices are one-based; negative values count back from the end of
/// the list declared so far.
fn resolve(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let position = index as usize - 1;
        (position < len).then_some(position)
    } else if index < 0 {
        let back = index.unsigned_abs() as usize;
        (back <= len).then_some(len - back)
    } else {
        None
    }
}

fn has_missing_normals(mesh: &MeshData) -> bool {
    mesh.vertices
        .chunks_exact(6)
        .any(|chunk| chunk[3] == 0.0 && chunk[4] == 0.0 && chunk[5] == 0.0)
}

/// Rebuilds vertex normals from face geometry. Each face contributes its
/// unnormalized cross product, so larger faces weigh more.
fn generate_normals(mesh: &mut MeshData) {
    let mut accumulated = vec![Vec3::ZERO; mesh.vertex_count()];
    for face in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [face[0] as usize, face[1] as usize, face[2] as usize];
        let pa = position_of(&mesh.vertices, a);
        let pb = position_of(&mesh.vertices, b);
        let pc = position_of(&mesh.vertices, c);
        let face_normal = (pb - pa).cross(pc - pa);
        accumulated[a] += face_normal;
        accumulated[b] += face_normal;
        accumulated[c] += face_normal;
    }
    for (index, normal) in accumulated.iter().enumerate() {
        let normal = normal.normalize_or_zero();
        let base = index * 6 + 3;
        mesh.vertices[base] = normal.x;
        mesh.vertices[base + 1] = normal.y;
        mesh.vertices[base + 2] = normal.z;
    }
}

fn position_of(vertices: &[f32], index: usize) -> Vec3 {
    let base = index * 6;
    Vec3::new(vertices[base], vertices[base + 1], vertices[base + 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn decodes_triangle_with_normals() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
";
        let mesh = decode_obj(text).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        // normal carried through for every corner
        for chunk in mesh.vertices.chunks_exact(6) {
            assert_eq!(&chunk[3..], &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn quad_faces_are_fanned() {
        let text = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
        let mesh = decode_obj(text).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
f -3 -2 -1
";
        let mesh = decode_obj(text).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn missing_normals_are_generated() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";
        let mesh = decode_obj(text).unwrap();
        for chunk in mesh.vertices.chunks_exact(6) {
            let normal = Vec3::new(chunk[3], chunk[4], chunk[5]);
            assert!((normal.length() - 1.0).abs() < EPS);
            // counter-clockwise in the XY plane faces +Z
            assert!((normal.z - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn corners_merge_only_when_position_and_normal_agree() {
        let text = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
vn 1 0 0
f 1//1 2//1 3//1
f 1//1 3//1 4//1
f 1//2 2//2 3//2
";
        let mesh = decode_obj(text).unwrap();
        // 4 corners with the first normal, 3 more with the second
        assert_eq!(mesh.vertex_count(), 7);
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(&mesh.indices[..6], &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn texture_coordinates_are_skipped() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.5 0.5
vn 0 0 1
f 1/1/1 2/1/1 3/1/1
";
        let mesh = decode_obj(text).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn comments_and_unknown_directives_are_ignored() {
        let text = "\
# emblem export
o emblem
v 0 0 0
v 1 0 0
v 0 1 0
s off
usemtl none
f 1 2 3
";
        assert!(decode_obj(text).is_ok());
    }

    #[test]
    fn empty_and_faceless_files_are_rejected() {
        assert!(matches!(decode_obj(""), Err(MeshError::Empty)));
        assert!(matches!(
            decode_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\n"),
            Err(MeshError::NoFaces)
        ));
    }

    #[test]
    fn out_of_range_face_index_is_rejected() {
        let text = "\
v 0 0 0
v 1 0 0
f 1 2 9
";
        assert!(matches!(
            decode_obj(text),
            Err(MeshError::IndexOutOfRange { index: 9 })
        ));
    }

    #[test]
    fn malformed_components_name_the_line() {
        let text = "\
v 0 0 0
v one 0 0
";
        let err = decode_obj(text).unwrap_err();
        assert!(err.to_string().starts_with("line 2:"), "{err}");
    }
}
