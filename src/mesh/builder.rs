//! Mesh construction utilities.
//!
//! Meshes are built from face-vertex lists, the layout most file formats and
//! procedural generators produce, and can be exported back to one.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Faces must be consistently oriented: every directed edge may appear in at
/// most one face. Vertices not referenced by any face are kept as isolated
/// vertices.
///
/// # Example
/// ```
/// use resurface::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_edges(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices.iter().map(|&pos| mesh.add_vertex(pos)).collect();

    // Undirected edge -> half-edge created first for it.
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::new();

    for face in faces {
        let mut loop_hes = [HalfEdgeId::<I>::invalid(); 3];

        for i in 0..3 {
            let (a, b) = (face[i], face[(i + 1) % 3]);
            let key = (a.min(b), a.max(b));

            let he = match edge_map.get(&key) {
                Some(&first) => {
                    // The first half-edge runs a -> b only if this directed
                    // edge was used before.
                    let he = if mesh.origin(first) == vertex_ids[a] {
                        first
                    } else {
                        first.opposite()
                    };
                    if !mesh.is_boundary_halfedge(he) {
                        return Err(MeshError::NonManifoldEdge { v0: a, v1: b });
                    }
                    he
                }
                None => {
                    let he = mesh.new_edge(vertex_ids[a], vertex_ids[b]);
                    edge_map.insert(key, he);
                    he
                }
            };
            loop_hes[i] = he;
        }

        let f = mesh.new_face(loop_hes[0]);
        for i in 0..3 {
            mesh.halfedge_mut(loop_hes[i]).face = f;
            mesh.set_next(loop_hes[i], loop_hes[(i + 1) % 3]);
            mesh.vertex_mut(vertex_ids[face[i]]).halfedge = loop_hes[i];
        }
    }

    link_boundary_loops(&mut mesh)?;
    fix_boundary_vertex_halfedges(&mut mesh);

    Ok(mesh)
}

/// Link boundary half-edges into loops.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<()> {
    let boundary_hes: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let mut outgoing: HashMap<VertexId<I>, HalfEdgeId<I>> = HashMap::new();
    for &he in &boundary_hes {
        let origin = mesh.origin(he);
        if outgoing.insert(origin, he).is_some() {
            return Err(MeshError::NonManifold {
                details: format!("vertex {} lies on more than one boundary fan", origin.index()),
            });
        }
    }

    // Incoming and outgoing boundary half-edges balance at every vertex, so
    // the lookup only misses on corrupted input.
    for &he in &boundary_hes {
        let dest = mesh.dest(he);
        match outgoing.get(&dest) {
            Some(&next) => mesh.set_next(he, next),
            None => {
                return Err(MeshError::NonManifold {
                    details: format!("boundary loop broken at vertex {}", dest.index()),
                })
            }
        }
    }

    Ok(())
}

/// Point boundary vertices at their outgoing boundary half-edge.
fn fix_boundary_vertex_halfedges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let ids: Vec<VertexId<I>> = mesh.vertex_ids().collect();
    for v in ids {
        if let Some(he) = mesh.vertex_halfedges(v).find(|&he| mesh.is_boundary_halfedge(he)) {
            mesh.vertex_mut(v).halfedge = he;
        }
    }
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Deleted elements are skipped and the surviving vertices renumbered in
/// order, so the output is compact even before garbage collection.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut remap = vec![usize::MAX; mesh.vertex_slots()];
    let mut vertices = Vec::with_capacity(mesh.num_vertices());
    for v in mesh.vertex_ids() {
        remap[v.index()] = vertices.len();
        vertices.push(*mesh.position(v));
    }

    let faces = mesh
        .face_ids()
        .map(|f| {
            let [v0, v1, v2] = mesh.face_triangle(f);
            [remap[v0.index()], remap[v1.index()], remap[v2.index()]]
        })
        .collect();

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{grid, tetrahedron};

    #[test]
    fn test_single_triangle() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_boundary_loop() {
        let mesh = grid(2, 1.0);
        assert!(mesh.is_valid());

        // Walk the boundary loop from one boundary half-edge.
        let start = mesh
            .halfedge_ids()
            .find(|&he| mesh.is_boundary_halfedge(he))
            .unwrap();
        let mut he = start;
        let mut count = 0;
        loop {
            assert!(mesh.is_boundary_halfedge(he));
            he = mesh.next(he);
            count += 1;
            if he == start {
                break;
            }
        }
        assert_eq!(count, 8);

        // The centre vertex of a 2x2 grid is interior.
        assert!(!mesh.is_boundary_vertex(VertexId::new(4)));
    }

    #[test]
    fn test_round_trip_counts() {
        let mesh = tetrahedron();
        let (vertices, faces) = to_face_vertex(&mesh);
        assert_eq!(vertices.len(), 4);
        assert_eq!(faces.len(), 4);

        let rebuilt: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
        assert_eq!(rebuilt.num_edges(), 6);
        assert!(rebuilt.is_valid());
    }

    #[test]
    fn test_invalid_index() {
        let vertices = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        let result: Result<HalfEdgeMesh> = build_from_triangles(&vertices, &[[0, 1, 2]]);
        assert!(matches!(result, Err(MeshError::InvalidVertexIndex { face: 0, vertex: 2 })));
    }

    #[test]
    fn test_degenerate_face() {
        let vertices = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        let result: Result<HalfEdgeMesh> = build_from_triangles(&vertices, &[[0, 1, 1]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_empty_faces() {
        let result: Result<HalfEdgeMesh> = build_from_triangles(&[Point3::origin()], &[]);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_inconsistent_orientation() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        // Both faces traverse 0 -> 1.
        let result: Result<HalfEdgeMesh> = build_from_triangles(&vertices, &[[0, 1, 2], [0, 1, 3]]);
        assert!(matches!(result, Err(MeshError::NonManifoldEdge { .. })));
    }
}
