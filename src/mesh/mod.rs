//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation the remeshing
//! pipeline works on.
//!
//! # Overview
//!
//! [`HalfEdgeMesh`] stores a triangle mesh as index-based arenas of vertices,
//! half-edges and faces. Half-edges are allocated in opposite pairs, so an
//! [`EdgeId`] is simply the index of a pair. Adjacency queries are O(1) and
//! circulation around a vertex or face is bounded by its degree.
//!
//! # Index Types
//!
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`EdgeId`] - Identifies a full edge
//! - [`FaceId`] - Identifies a face
//!
//! These are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing `u16`, `u32` or `u64` indices.
//!
//! # Attributes
//!
//! Per-element data is stored in typed columns addressed by [`Attribute`]
//! handles; see the [`attribute`] module.
//!
//! # Editing
//!
//! [`HalfEdgeMesh::split`], [`HalfEdgeMesh::collapse`] and
//! [`HalfEdgeMesh::flip`] rewrite connectivity locally; deleted elements are
//! reclaimed by [`HalfEdgeMesh::garbage_collection`].
//!
//! ```
//! use resurface::mesh::{HalfEdgeMesh, EdgeId, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! mesh.split_edge_at(EdgeId::new(0), Point3::new(0.5, 0.0, 0.0));
//! assert_eq!(mesh.num_faces(), 2);
//! assert!(mesh.is_valid());
//! ```

pub mod attribute;
mod builder;
mod halfedge;
mod index;
mod topology;

#[cfg(test)]
pub(crate) mod test_meshes;

pub use attribute::{
    Attribute, AttributeValue, EdgeAttribute, EdgeKind, ElementId, ElementKind, ElementType,
    FaceAttribute, FaceKind, VertexAttribute, VertexKind,
};
pub use builder::{build_from_triangles, to_face_vertex};
pub use halfedge::{Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

pub(crate) use halfedge::normalize_or_zero;
