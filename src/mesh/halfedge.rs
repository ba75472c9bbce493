//! Half-edge mesh data structure.
//!
//! # Structure
//!
//! - Each edge is stored as two **half-edges** pointing in opposite
//!   directions. The pair is allocated together, so the opposite of half-edge
//!   `h` is always `h ^ 1` and both belong to edge `h / 2`.
//! - Each half-edge knows its **origin vertex**, the **next** and **previous**
//!   half-edge around its face, and its **incident face**.
//! - Each vertex stores one outgoing half-edge; for boundary vertices it is a
//!   boundary half-edge.
//! - Each face stores one half-edge on its boundary.
//!
//! # Boundary Handling
//!
//! Boundary half-edges have an invalid face. They are linked with `next` and
//! `prev` into loops that run around each hole.
//!
//! # Deletion
//!
//! Structural edits that remove elements only flag them as deleted.
//! Iterators skip deleted elements, and
//! [`garbage_collection`](HalfEdgeMesh::garbage_collection) compacts the
//! storage.

use nalgebra::{Point3, Vector3};

use super::attribute::{
    Attribute, AttributeTable, AttributeValue, ElementId, ElementKind, ElementType,
};
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

/// Squared length below which a normal is treated as undefined.
const NORMAL_EPSILON: f64 = 1e-30;

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge, a boundary one if the vertex is on the boundary.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create an isolated vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge starts at.
    pub origin: VertexId<I>,

    /// The next half-edge around the face (or boundary loop).
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face (or boundary loop).
    pub prev: HalfEdgeId<I>,

    /// Incident face, invalid for boundary half-edges.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create an unlinked half-edge starting at `origin`.
    pub fn new(origin: VertexId<I>) -> Self {
        Self {
            origin,
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Check if this half-edge is on the boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge on the boundary of this face.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Face<I> {
    /// Create a new face with the given half-edge.
    pub fn new(halfedge: HalfEdgeId<I>) -> Self {
        Self { halfedge }
    }
}

/// A half-edge mesh data structure for triangle meshes.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,

    pub(crate) vertex_deleted: Vec<bool>,
    pub(crate) edge_deleted: Vec<bool>,
    pub(crate) face_deleted: Vec<bool>,
    pub(crate) deleted_vertices: usize,
    pub(crate) deleted_edges: usize,
    pub(crate) deleted_faces: usize,

    pub(crate) vertex_attributes: AttributeTable,
    pub(crate) edge_attributes: AttributeTable,
    pub(crate) face_attributes: AttributeTable,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Closed mesh: E = 3F/2; leave room for boundary edges.
        let num_edges = num_faces * 3 / 2 + num_faces / 4;

        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_edges * 2),
            faces: Vec::with_capacity(num_faces),
            vertex_deleted: Vec::with_capacity(num_vertices),
            edge_deleted: Vec::with_capacity(num_edges),
            face_deleted: Vec::with_capacity(num_faces),
            deleted_vertices: 0,
            deleted_edges: 0,
            deleted_faces: 0,
            vertex_attributes: AttributeTable::default(),
            edge_attributes: AttributeTable::default(),
            face_attributes: AttributeTable::default(),
        }
    }

    // ==================== Counts ====================

    /// Number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() - self.deleted_vertices
    }

    /// Number of live edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.halfedges.len() / 2 - self.deleted_edges
    }

    /// Number of live half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.num_edges() * 2
    }

    /// Number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len() - self.deleted_faces
    }

    /// Size of the vertex arena, deleted slots included.
    #[inline]
    pub fn vertex_slots(&self) -> usize {
        self.vertices.len()
    }

    /// Size of the edge arena, deleted slots included.
    #[inline]
    pub fn edge_slots(&self) -> usize {
        self.halfedges.len() / 2
    }

    /// Size of the face arena, deleted slots included.
    #[inline]
    pub fn face_slots(&self) -> usize {
        self.faces.len()
    }

    /// Whether `vertices` more vertices, `edges` more edges and `faces` more
    /// faces can be added without running out of indices of type `I`.
    pub fn has_capacity(&self, vertices: usize, edges: usize, faces: usize) -> bool {
        let limit = I::MAX.to_usize() + 1;
        self.vertices.len() + vertices <= limit
            && self.halfedges.len() + 2 * edges <= limit
            && self.faces.len() + faces <= limit
    }

    /// Whether any element is flagged deleted and awaiting compaction.
    #[inline]
    pub fn has_garbage(&self) -> bool {
        self.deleted_vertices + self.deleted_edges + self.deleted_faces > 0
    }

    // ==================== Accessors ====================

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by ID.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    /// Get a mutable half-edge by ID.
    #[inline]
    pub fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get a mutable face by ID.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId<I>) -> &mut Face<I> {
        &mut self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    /// Whether a vertex is flagged deleted.
    #[inline]
    pub fn is_deleted_vertex(&self, v: VertexId<I>) -> bool {
        self.vertex_deleted[v.index()]
    }

    /// Whether an edge is flagged deleted.
    #[inline]
    pub fn is_deleted_edge(&self, e: EdgeId<I>) -> bool {
        self.edge_deleted[e.index()]
    }

    /// Whether a face is flagged deleted.
    #[inline]
    pub fn is_deleted_face(&self, f: FaceId<I>) -> bool {
        self.face_deleted[f.index()]
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        he.opposite()
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(he.opposite())
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Get the edge a half-edge belongs to.
    #[inline]
    pub fn edge_of(&self, he: HalfEdgeId<I>) -> EdgeId<I> {
        he.edge()
    }

    /// Get one of the two half-edges of an edge.
    #[inline]
    pub fn edge_halfedge(&self, e: EdgeId<I>, side: usize) -> HalfEdgeId<I> {
        e.halfedge(side)
    }

    /// The two endpoints of an edge, in the direction of its first half-edge.
    #[inline]
    pub fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2] {
        let h = e.halfedge(0);
        [self.origin(h), self.dest(h)]
    }

    /// Check if a half-edge is on the boundary.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if a vertex is on the boundary (isolated vertices count as boundary).
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let start = self.vertex(v).halfedge;
        if !start.is_valid() {
            return true;
        }
        self.vertex_halfedges(v)
            .any(|he| self.is_boundary_halfedge(he))
    }

    /// Check if an edge (given by one of its half-edges) is on the boundary.
    #[inline]
    pub fn is_boundary_edge(&self, he: HalfEdgeId<I>) -> bool {
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(he.opposite())
    }

    /// Check if an edge is on the boundary.
    #[inline]
    pub fn is_edge_on_boundary(&self, e: EdgeId<I>) -> bool {
        self.is_boundary_edge(e.halfedge(0))
    }

    /// Whether a vertex has no incident edges.
    #[inline]
    pub fn is_isolated(&self, v: VertexId<I>) -> bool {
        !self.vertex(v).halfedge.is_valid()
    }

    /// Find the half-edge running from `a` to `b`, if any.
    pub fn find_halfedge(&self, a: VertexId<I>, b: VertexId<I>) -> Option<HalfEdgeId<I>> {
        self.vertex_halfedges(a).find(|&he| self.dest(he) == b)
    }

    // ==================== Iteration ====================

    /// Iterate over live vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len())
            .filter(move |&i| !self.vertex_deleted[i])
            .map(VertexId::new)
    }

    /// Iterate over live vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex<I>)> + '_ {
        self.vertex_ids().map(move |v| (v, self.vertex(v)))
    }

    /// Iterate over live edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.edge_slots())
            .filter(move |&i| !self.edge_deleted[i])
            .map(EdgeId::new)
    }

    /// Iterate over live half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        (0..self.halfedges.len())
            .filter(move |&i| !self.edge_deleted[i >> 1])
            .map(HalfEdgeId::new)
    }

    /// Iterate over live face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len())
            .filter(move |&i| !self.face_deleted[i])
            .map(FaceId::new)
    }

    /// Iterate over outgoing half-edges around a vertex.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// Iterate over half-edges around a face.
    pub fn face_halfedges(&self, f: FaceId<I>) -> FaceHalfEdgeIter<'_, I> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Iterate over vertices of a face.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Get the three vertices of a triangular face.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Get the positions of the three vertices of a triangular face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        let [v0, v1, v2] = self.face_triangle(f);
        [*self.position(v0), *self.position(v1), *self.position(v2)]
    }

    // ==================== Geometry ====================

    /// Unit normal of a face, or zero for a degenerate face.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        normalize_or_zero((p1 - p0).cross(&(p2 - p0)))
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Area-weighted unit normal at a vertex, or zero if undefined.
    pub fn vertex_normal(&self, v: VertexId<I>) -> Vector3<f64> {
        let mut normal = Vector3::zeros();
        for f in self.vertex_faces(v) {
            let [p0, p1, p2] = self.face_positions(f);
            normal += (p1 - p0).cross(&(p2 - p0));
        }
        normalize_or_zero(normal)
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, he: HalfEdgeId<I>) -> f64 {
        self.edge_vector(he).norm()
    }

    /// Compute the edge vector (from origin to destination).
    pub fn edge_vector(&self, he: HalfEdgeId<I>) -> Vector3<f64> {
        self.position(self.dest(he)) - self.position(self.origin(he))
    }

    /// Compute the midpoint of an edge.
    pub fn edge_midpoint(&self, he: HalfEdgeId<I>) -> Point3<f64> {
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        Point3::from((p0.coords + p1.coords) * 0.5)
    }

    /// Compute the valence (degree) of a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Axis-aligned bounding box of the live vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut ids = self.vertex_ids();
        let first = *self.position(ids.next()?);
        let (mut min, mut max) = (first, first);

        for v in ids {
            let p = self.position(v);
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        Some((min, max))
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    // ==================== Construction ====================

    /// Add a new isolated vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        self.vertex_deleted.push(false);
        self.vertex_attributes.push_default();
        id
    }

    /// Allocate an edge from `a` to `b`; returns the half-edge `a -> b`.
    ///
    /// The new half-edges are unlinked and have no face.
    pub(crate) fn new_edge(&mut self, a: VertexId<I>, b: VertexId<I>) -> HalfEdgeId<I> {
        let h = HalfEdgeId::new(self.halfedges.len());
        self.halfedges.push(HalfEdge::new(a));
        self.halfedges.push(HalfEdge::new(b));
        self.edge_deleted.push(false);
        self.edge_attributes.push_default();
        h
    }

    /// Allocate a face whose loop starts at `halfedge`.
    pub(crate) fn new_face(&mut self, halfedge: HalfEdgeId<I>) -> FaceId<I> {
        let f = FaceId::new(self.faces.len());
        self.faces.push(Face::new(halfedge));
        self.face_deleted.push(false);
        self.face_attributes.push_default();
        f
    }

    /// Link `he -> next` in both directions.
    #[inline]
    pub(crate) fn set_next(&mut self, he: HalfEdgeId<I>, next: HalfEdgeId<I>) {
        self.halfedge_mut(he).next = next;
        self.halfedge_mut(next).prev = he;
    }

    // ==================== Attributes ====================

    fn attribute_table<K: ElementKind>(&self) -> &AttributeTable {
        match K::TYPE {
            ElementType::Vertex => &self.vertex_attributes,
            ElementType::Edge => &self.edge_attributes,
            ElementType::Face => &self.face_attributes,
        }
    }

    fn attribute_table_mut<K: ElementKind>(&mut self) -> &mut AttributeTable {
        match K::TYPE {
            ElementType::Vertex => &mut self.vertex_attributes,
            ElementType::Edge => &mut self.edge_attributes,
            ElementType::Face => &mut self.face_attributes,
        }
    }

    /// Add an attribute column initialised to `default` for every element slot.
    pub fn add_attribute<K: ElementKind, T: AttributeValue>(&mut self, default: T) -> Attribute<K, T> {
        let len = match K::TYPE {
            ElementType::Vertex => self.vertex_slots(),
            ElementType::Edge => self.edge_slots(),
            ElementType::Face => self.face_slots(),
        };
        self.attribute_table_mut::<K>().add(default, len)
    }

    /// Whether the handle refers to a live column of this mesh.
    pub fn has_attribute<K: ElementKind, T: AttributeValue>(&self, attr: Attribute<K, T>) -> bool {
        self.attribute_table::<K>().contains(attr)
    }

    /// Values of an attribute indexed by element slot, or `None` for a stale handle.
    pub fn try_attribute<K: ElementKind, T: AttributeValue>(&self, attr: Attribute<K, T>) -> Option<&[T]> {
        self.attribute_table::<K>().get(attr)
    }

    /// Values of an attribute indexed by element slot.
    ///
    /// # Panics
    /// Panics if the handle is stale.
    pub fn attribute<K: ElementKind, T: AttributeValue>(&self, attr: Attribute<K, T>) -> &[T] {
        match self.attribute_table::<K>().get(attr) {
            Some(values) => values,
            None => panic!("stale attribute handle {:?}", attr),
        }
    }

    /// Mutable values of an attribute indexed by element slot.
    ///
    /// # Panics
    /// Panics if the handle is stale.
    pub fn attribute_mut<K: ElementKind, T: AttributeValue>(&mut self, attr: Attribute<K, T>) -> &mut [T] {
        match self.attribute_table_mut::<K>().get_mut(attr) {
            Some(values) => values,
            None => panic!("stale attribute handle {:?}", attr),
        }
    }

    /// Value of an attribute at one element.
    #[inline]
    pub fn attr<E: ElementId<I>, T: AttributeValue + Copy>(&self, attr: Attribute<E::Kind, T>, id: E) -> T {
        self.attribute(attr)[id.slot()]
    }

    /// Set the value of an attribute at one element.
    #[inline]
    pub fn set_attr<E: ElementId<I>, T: AttributeValue>(&mut self, attr: Attribute<E::Kind, T>, id: E, value: T) {
        self.attribute_mut(attr)[id.slot()] = value;
    }

    /// Remove an attribute column. Returns `false` if the handle was stale.
    pub fn remove_attribute<K: ElementKind, T: AttributeValue>(&mut self, attr: Attribute<K, T>) -> bool {
        self.attribute_table_mut::<K>().remove(attr)
    }

    /// Number of attribute columns attached to an element kind.
    pub fn num_attributes(&self, kind: ElementType) -> usize {
        match kind {
            ElementType::Vertex => self.vertex_attributes.len(),
            ElementType::Edge => self.edge_attributes.len(),
            ElementType::Face => self.face_attributes.len(),
        }
    }

    /// Drop every attribute column of every element kind.
    pub fn clear_attributes(&mut self) {
        self.vertex_attributes.clear();
        self.edge_attributes.clear();
        self.face_attributes.clear();
    }

    // ==================== Validation ====================

    /// Check connectivity consistency of all live elements.
    ///
    /// Verifies that `next`/`prev` are mutual inverses, that consecutive
    /// half-edges share their vertex, that half-edges of a loop agree on the
    /// face, that every live face is a triangle, and that no live element
    /// refers to a deleted one.
    pub fn is_valid(&self) -> bool {
        let vertex_ok = |v: VertexId<I>| v.is_valid() && v.index() < self.vertices.len() && !self.is_deleted_vertex(v);
        let halfedge_ok = |h: HalfEdgeId<I>| {
            h.is_valid() && h.index() < self.halfedges.len() && !self.is_deleted_edge(h.edge())
        };
        let face_ok = |f: FaceId<I>| f.is_valid() && f.index() < self.faces.len() && !self.is_deleted_face(f);

        for v in self.vertex_ids() {
            let he = self.vertex(v).halfedge;
            if !he.is_valid() {
                continue;
            }
            if !halfedge_ok(he) || self.origin(he) != v {
                return false;
            }
            // A boundary vertex must point at a boundary half-edge.
            let on_boundary = self.vertex_halfedges(v).any(|h| self.is_boundary_halfedge(h));
            if on_boundary && !self.is_boundary_halfedge(he) {
                return false;
            }
        }

        for he in self.halfedge_ids() {
            let data = self.halfedge(he);
            if !vertex_ok(data.origin) || !halfedge_ok(data.next) || !halfedge_ok(data.prev) {
                return false;
            }
            if self.prev(data.next) != he || self.next(data.prev) != he {
                return false;
            }
            if self.origin(data.next) != self.dest(he) {
                return false;
            }
            if self.face_of(data.next) != data.face {
                return false;
            }
            if data.face.is_valid() && !face_ok(data.face) {
                return false;
            }
            if data.origin == self.dest(he) {
                return false;
            }
            if !data.face.is_valid() && self.is_boundary_halfedge(he.opposite()) {
                return false;
            }
        }

        for f in self.face_ids() {
            let he = self.face(f).halfedge;
            if !halfedge_ok(he) || self.face_of(he) != f {
                return false;
            }
            if self.next(self.next(self.next(he))) != he {
                return false;
            }
        }

        true
    }
}

/// Normalize, mapping vanishing vectors to zero instead of NaN.
#[inline]
pub(crate) fn normalize_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    let len2 = v.norm_squared();
    if len2 > NORMAL_EPSILON {
        v / len2.sqrt()
    } else {
        Vector3::zeros()
    }
}

/// Iterator over outgoing half-edges around a vertex.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // v -> w, then w -> v, then the half-edge after it leaves v again.
        self.current = self.mesh.next(self.current.opposite());

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> FaceHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, f: FaceId<I>) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for FaceHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}
