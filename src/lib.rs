//! # Resurface
//!
//! Uniform and curvature-adaptive remeshing of triangle surfaces.
//!
//! Resurface stores meshes in a half-edge data structure with typed
//! per-element attributes, and rebuilds their triangulation with the classic
//! split / collapse / flip / smooth loop while keeping vertices on the input
//! surface and sharp features intact.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Typed attributes**: Per-vertex, per-edge and per-face columns with checked handles
//! - **Curvature**: Analytic and tensor-based principal curvature estimation
//! - **Projection**: R-tree backed closest-point queries on a reference surface
//! - **Remeshing**: Uniform and adaptive sizing with feature preservation
//!
//! ## Quick Start
//!
//! ```
//! use resurface::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let options = RemeshOptions::uniform(0.2).with_iterations(5);
//! let stats = remesh(&mut mesh, &options).unwrap();
//! println!("{}", stats);
//! assert!(mesh.num_faces() > 4);
//! ```
//!
//! ## Mesh Traversal
//!
//! The half-edge structure enables efficient traversal of mesh elements:
//!
//! ```
//! use resurface::prelude::*;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(0.5, 1.0, 0.0),
//! # ];
//! # let faces = vec![[0, 1, 2]];
//! # let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! // Iterate over neighbors of a vertex
//! let v = VertexId::new(0);
//! for neighbor in mesh.vertex_neighbors(v) {
//!     println!("Neighbor: {:?}", neighbor);
//! }
//!
//! // Iterate over faces around a vertex
//! for face in mesh.vertex_faces(v) {
//!     println!("Adjacent face: {:?}", face);
//! }
//!
//! // Get vertices of a face
//! let f = FaceId::new(0);
//! let [v0, v1, v2] = mesh.face_triangle(f);
//! ```
//!
//! ## Logging
//!
//! Progress is logged through the [`log`](https://docs.rs/log) facade; install
//! any logger to see it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use resurface::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::remesh::{
        remesh, remesh_adaptive, remesh_uniform, remesh_with_progress, RemeshOptions, RemeshStats,
    };
    pub use crate::algo::Progress;
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_triangles, to_face_vertex, EdgeAttribute, EdgeId, EdgeKind, ElementType,
        FaceAttribute, FaceId, FaceKind, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexAttribute,
        VertexId, VertexKind,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
