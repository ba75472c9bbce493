//! Nearest-triangle queries against a fixed reference surface.
//!
//! [`ProjectionOracle`] indexes the triangles of a mesh in an R-tree and
//! answers "which point of the surface is closest to `p`" queries. The
//! remesher uses it through [`ReferenceSurface`], which additionally keeps a
//! frozen copy of the input mesh with per-vertex normals and sizing values so
//! that projected vertices can inherit interpolated attributes.
//!
//! # Example
//!
//! ```
//! use resurface::prelude::*;
//! use resurface::algo::projection::ProjectionOracle;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! let oracle = ProjectionOracle::build(&mesh);
//! let hit = oracle.nearest(&Point3::new(0.2, 0.2, 1.0)).unwrap();
//! assert!((hit.distance - 1.0).abs() < 1e-12);
//! ```

use nalgebra::{Point3, Vector3};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use super::closest_point::{barycentric_coordinates, closest_point_on_triangle};
use crate::mesh::{normalize_or_zero, FaceId, HalfEdgeMesh, MeshIndex, VertexAttribute, VertexId};

/// A reference triangle stored in the R-tree.
#[derive(Debug, Clone)]
struct TriangleLeaf<I: MeshIndex> {
    face: FaceId<I>,
    corners: [Point3<f64>; 3],
}

impl<I: MeshIndex> TriangleLeaf<I> {
    fn closest(&self, p: &Point3<f64>) -> (f64, Point3<f64>) {
        let [a, b, c] = &self.corners;
        closest_point_on_triangle(p, a, b, c)
    }
}

impl<I: MeshIndex> RTreeObject for TriangleLeaf<I> {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        let [a, b, c] = &self.corners;
        let min = [
            a.x.min(b.x).min(c.x),
            a.y.min(b.y).min(c.y),
            a.z.min(b.z).min(c.z),
        ];
        let max = [
            a.x.max(b.x).max(c.x),
            a.y.max(b.y).max(c.y),
            a.z.max(b.z).max(c.z),
        ];
        AABB::from_corners(min, max)
    }
}

impl<I: MeshIndex> PointDistance for TriangleLeaf<I> {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let (d, _) = self.closest(&Point3::from(*point));
        d * d
    }
}

/// Result of a nearest-triangle query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<I: MeshIndex = u32> {
    /// Closest point on the surface.
    pub point: Point3<f64>,
    /// Face containing [`point`](Self::point).
    pub face: FaceId<I>,
    /// Euclidean distance from the query to [`point`](Self::point).
    pub distance: f64,
}

/// Spatial index over the live triangles of a mesh.
///
/// The oracle copies triangle corners at build time, so later edits of the
/// source mesh do not affect it.
#[derive(Debug, Clone)]
pub struct ProjectionOracle<I: MeshIndex = u32> {
    tree: RTree<TriangleLeaf<I>>,
}

impl<I: MeshIndex> ProjectionOracle<I> {
    /// Bulk-load an R-tree over every live face of `mesh`.
    pub fn build(mesh: &HalfEdgeMesh<I>) -> Self {
        let leaves: Vec<_> = mesh
            .face_ids()
            .map(|face| TriangleLeaf {
                face,
                corners: mesh.face_positions(face),
            })
            .collect();

        Self {
            tree: RTree::bulk_load(leaves),
        }
    }

    /// Number of indexed triangles.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether no triangle is indexed.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Closest surface point to `p`, or `None` when the index is empty.
    pub fn nearest(&self, p: &Point3<f64>) -> Option<Nearest<I>> {
        let leaf = self.tree.nearest_neighbor(&[p.x, p.y, p.z])?;
        let (distance, point) = leaf.closest(p);
        Some(Nearest {
            point,
            face: leaf.face,
            distance,
        })
    }
}

/// A projected position with attributes interpolated from the reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection<I: MeshIndex = u32> {
    /// Closest point on the reference surface.
    pub point: Point3<f64>,
    /// Interpolated unit normal.
    pub normal: Vector3<f64>,
    /// Interpolated sizing value.
    pub sizing: f64,
    /// Reference face containing the point.
    pub face: FaceId<I>,
}

/// Frozen copy of a mesh used to keep a remeshed surface on its original shape.
#[derive(Debug, Clone)]
pub struct ReferenceSurface<I: MeshIndex = u32> {
    mesh: HalfEdgeMesh<I>,
    normals: VertexAttribute<Vector3<f64>>,
    sizing: VertexAttribute<f64>,
    oracle: ProjectionOracle<I>,
}

impl<I: MeshIndex> ReferenceSurface<I> {
    /// Snapshot `mesh` together with a sizing value per vertex.
    ///
    /// The copy drops every attribute of the source and stores its own
    /// normals (area weighted) and sizing columns.
    pub fn new<F>(mesh: &HalfEdgeMesh<I>, sizing_of: F) -> Self
    where
        F: Fn(VertexId<I>) -> f64,
    {
        let mut snapshot = mesh.clone();
        snapshot.clear_attributes();

        let normals = snapshot.add_attribute(Vector3::zeros());
        let sizing = snapshot.add_attribute(0.0);

        let vertex_data: Vec<_> = snapshot
            .vertex_ids()
            .map(|v| (v, snapshot.vertex_normal(v), sizing_of(v)))
            .collect();
        for (v, n, h) in vertex_data {
            snapshot.set_attr(normals, v, n);
            snapshot.set_attr(sizing, v, h);
        }

        let oracle = ProjectionOracle::build(&snapshot);

        Self {
            mesh: snapshot,
            normals,
            sizing,
            oracle,
        }
    }

    /// The frozen mesh.
    pub fn mesh(&self) -> &HalfEdgeMesh<I> {
        &self.mesh
    }

    /// The spatial index over the frozen mesh.
    pub fn oracle(&self) -> &ProjectionOracle<I> {
        &self.oracle
    }

    /// Project `p` onto the reference surface and interpolate its attributes.
    pub fn project(&self, p: &Point3<f64>) -> Option<Projection<I>> {
        let hit = self.oracle.nearest(p)?;
        let [v0, v1, v2] = self.mesh.face_triangle(hit.face);
        let [p0, p1, p2] = self.mesh.face_positions(hit.face);
        let b = barycentric_coordinates(&hit.point, &p0, &p1, &p2);

        let normals = self.mesh.attribute(self.normals);
        let interpolated = normals[v0.index()] * b[0]
            + normals[v1.index()] * b[1]
            + normals[v2.index()] * b[2];
        let mut normal = normalize_or_zero(interpolated);
        if normal == Vector3::zeros() {
            normal = self.mesh.face_normal(hit.face);
        }

        let sizing = self.mesh.attribute(self.sizing);
        let h = sizing[v0.index()] * b[0] + sizing[v1.index()] * b[1] + sizing[v2.index()] * b[2];

        Some(Projection {
            point: hit.point,
            normal,
            sizing: h,
            face: hit.face,
        })
    }
}
