//! Surface remeshing.
//!
//! Remeshing replaces the triangulation of a surface with one whose edges
//! follow a per-vertex target length, either the same everywhere (uniform) or
//! derived from curvature and a chordal error bound (adaptive).
//!
//! # Algorithm
//!
//! After preprocessing (locking, feature detection, sizing field, reference
//! snapshot), each iteration applies:
//!
//! 1. **Split** edges longer than 4/3 × the local target length
//! 2. **Collapse** edges shorter than 4/5 × the local target length
//! 3. **Flip** edges to bring vertex valences towards 6 (4 on the boundary)
//! 4. **Tangential smoothing** of vertex positions, followed by projection
//!    back onto the input surface
//!
//! Finally, triangles with an angle above the cap angle are removed by
//! flipping.
//!
//! Boundary edges and edges with a dihedral angle above the feature angle
//! are kept as feature lines: they are split and collapsed only along
//! themselves. Vertices outside a selection, and the ends, junctions and sharp
//! bends of feature lines, are locked and never move.
//!
//! # Example
//!
//! ```
//! use resurface::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//!
//! let stats = remesh_uniform(&mut mesh, 0.25, 5, true).unwrap();
//! assert!(stats.faces_after > stats.faces_before);
//! assert!(mesh.is_valid());
//! ```
//!
//! # References
//!
//! - Botsch, M., & Kobbelt, L. (2004). "A remeshing approach to multiresolution modeling."
//!   Symposium on Geometry Processing.
//! - Dunyach, M., et al. (2013). "Adaptive remeshing for real-time mesh deformation."
//!   Eurographics.

mod caps;
mod collapse;
mod driver;
mod features;
mod flip;
mod options;
mod sizing;
mod smooth;
mod split;
mod stats;

pub use features::mark_feature_edges;
pub use options::{
    RemeshOptions, SizingMode, DEFAULT_CAP_ANGLE, DEFAULT_COLLAPSE_RATIO, DEFAULT_FEATURE_ANGLE,
    DEFAULT_ITERATIONS, DEFAULT_MAX_PASSES, DEFAULT_SMOOTHING_ITERATIONS, DEFAULT_SPLIT_RATIO,
};
pub use sizing::edge_length_from_curvature;
pub use stats::RemeshStats;

use log::info;

use crate::algo::Progress;
use crate::error::Result;
use crate::mesh::{HalfEdgeMesh, MeshIndex};

use driver::Remesher;

/// Remesh towards a uniform edge length.
///
/// See [`remesh`] for details.
pub fn remesh_uniform<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    target_length: f64,
    iterations: usize,
    use_projection: bool,
) -> Result<RemeshStats> {
    let options = RemeshOptions::uniform(target_length)
        .with_iterations(iterations)
        .with_projection(use_projection);
    remesh(mesh, &options)
}

/// Remesh with edge lengths adapted to curvature.
///
/// Target lengths are clamped to `[min_edge_length, max_edge_length]`;
/// `approximation_error` bounds the distance between an edge and the
/// surface it approximates. See [`remesh`] for details.
pub fn remesh_adaptive<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    min_edge_length: f64,
    max_edge_length: f64,
    approximation_error: f64,
    iterations: usize,
    use_projection: bool,
) -> Result<RemeshStats> {
    let options = RemeshOptions::adaptive(min_edge_length, max_edge_length, approximation_error)
        .with_iterations(iterations)
        .with_projection(use_projection);
    remesh(mesh, &options)
}

/// Remesh `mesh` in place.
///
/// Returns an error for invalid options or for a selection / feature edge
/// handle that does not belong to `mesh`; the mesh is left untouched then.
/// A mesh without faces is returned as is.
pub fn remesh<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &RemeshOptions) -> Result<RemeshStats> {
    remesh_internal(mesh, options, None)
}

/// Remesh `mesh` in place with progress reporting.
///
/// See [`remesh`] for details.
pub fn remesh_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &RemeshOptions,
    progress: &Progress,
) -> Result<RemeshStats> {
    remesh_internal(mesh, options, Some(progress))
}

fn remesh_internal<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &RemeshOptions,
    progress: Option<&Progress>,
) -> Result<RemeshStats> {
    options.validate()?;

    if mesh.num_faces() == 0 {
        info!("nothing to remesh: mesh has no faces");
        let stats = RemeshStats {
            vertices_before: mesh.num_vertices(),
            vertices_after: mesh.num_vertices(),
            ..RemeshStats::default()
        };
        return Ok(stats);
    }

    let remesher = Remesher::new(mesh, options)?;
    Ok(remesher.run(progress))
}

/// Average length of the live edges, or zero for a mesh without edges.
///
/// A reasonable starting point for a uniform target length.
pub fn average_edge_length<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> f64 {
    let (total, count) = mesh
        .edge_ids()
        .fold((0.0, 0usize), |(total, count), e| (total + mesh.edge_length(e.halfedge(0)), count + 1));

    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;
    use crate::mesh::test_meshes::{cube, grid, icosphere};
    use crate::mesh::ElementType;

    #[test]
    fn test_average_edge_length() {
        let mesh = grid(2, 1.0);
        // 12 unit edges and 4 diagonals.
        let expected = (12.0 + 4.0 * 2.0_f64.sqrt()) / 16.0;
        assert!((average_edge_length(&mesh) - expected).abs() < 1e-12);
        assert_eq!(average_edge_length(&HalfEdgeMesh::<u32>::new()), 0.0);
    }

    #[test]
    fn test_uniform_remesh_of_sphere() {
        let mut mesh = icosphere(2);
        let target = 0.2;
        let stats = remesh_uniform(&mut mesh, target, 5, true).unwrap();

        assert_eq!(stats.iterations, 5);
        assert!(mesh.is_valid());
        assert!(!mesh.has_garbage());
        assert_eq!(mesh.num_vertices(), stats.vertices_after);
        assert_eq!(mesh.num_faces(), stats.faces_after);

        let mean = average_edge_length(&mesh);
        assert!(mean > 0.75 * target && mean < 1.35 * target, "{}", mean);
        for v in mesh.vertex_ids() {
            let r = mesh.position(v).coords.norm();
            assert!(r > 0.95 && r < 1.0 + 1e-9);
        }
        assert_eq!(mesh.num_attributes(ElementType::Vertex), 0);
        assert_eq!(mesh.num_attributes(ElementType::Edge), 0);
    }

    #[test]
    fn test_adaptive_remesh_of_cube_keeps_corners() {
        let mut mesh = cube(3, 1.0);
        let stats = remesh_adaptive(&mut mesh, 0.05, 0.4, 0.01, 3, true).unwrap();
        assert!(mesh.is_valid());
        assert!(stats.faces_after > 0);

        for corner in 0..8 {
            let c = nalgebra::Point3::new(
                (corner & 1) as f64,
                ((corner >> 1) & 1) as f64,
                ((corner >> 2) & 1) as f64,
            );
            assert!(mesh.vertex_ids().any(|v| *mesh.position(v) == c));
        }
    }

    #[test]
    fn test_invalid_options_leave_mesh_untouched() {
        let mut mesh = grid(2, 1.0);
        let before = mesh.clone();
        let err = remesh_uniform(&mut mesh, -1.0, 3, true).unwrap_err();
        assert!(matches!(err, MeshError::InvalidParameter { .. }));
        assert_eq!(mesh.num_vertices(), before.num_vertices());
        assert_eq!(mesh.num_faces(), before.num_faces());
    }

    #[test]
    fn test_empty_mesh_is_a_no_op() {
        let mut mesh: HalfEdgeMesh = HalfEdgeMesh::new();
        let stats = remesh_uniform(&mut mesh, 0.1, 3, true).unwrap();
        assert_eq!(stats, RemeshStats::default());
    }

    #[test]
    fn test_zero_iterations_only_removes_caps() {
        let mut mesh = icosphere(1);
        let faces = mesh.num_faces();
        let stats = remesh_uniform(&mut mesh, 0.1, 0, false).unwrap();
        assert_eq!(stats.iterations, 0);
        assert_eq!(stats.splits + stats.collapses + stats.flips, 0);
        assert_eq!(mesh.num_faces(), faces);
    }
}
