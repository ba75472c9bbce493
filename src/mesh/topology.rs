//! Structural edits on the half-edge mesh.
//!
//! The local operators used by remeshing: edge split, half-edge collapse and
//! edge flip, their legality predicates, and compaction of deleted elements.
//! Every operator keeps the mesh valid in the sense of
//! [`HalfEdgeMesh::is_valid`] as long as its predicate holds.

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Split an edge at a new vertex placed at `point`.
    ///
    /// Returns the new vertex. See [`split`](Self::split).
    pub fn split_edge_at(&mut self, e: EdgeId<I>, point: Point3<f64>) -> VertexId<I> {
        let v = self.add_vertex(point);
        self.split(e, v);
        v
    }

    /// Split edge `e = (a, b)` at the isolated vertex `v`.
    ///
    /// `v` is connected to the opposite corner of each incident triangle, so
    /// one or two triangles become two or four. Edge `e` keeps the part
    /// `(v, b)`; the returned half-edge runs `a -> v` and belongs to the new
    /// edge holding the other part.
    pub fn split(&mut self, e: EdgeId<I>, v: VertexId<I>) -> HalfEdgeId<I> {
        let h0 = e.halfedge(0);
        let o0 = e.halfedge(1);
        let a = self.origin(h0);

        let e1 = self.new_edge(v, a);
        let t1 = e1.opposite();

        let f0 = self.face_of(h0);
        let f3 = self.face_of(o0);

        self.vertex_mut(v).halfedge = h0;
        self.halfedge_mut(h0).origin = v;

        if f0.is_valid() {
            let h1 = self.next(h0);
            let h2 = self.next(h1);
            let v1 = self.dest(h1);

            let e0 = self.new_edge(v, v1);
            let t0 = e0.opposite();

            let f1 = self.new_face(h2);
            self.face_mut(f0).halfedge = h0;

            for he in [h0, h1, t0] {
                self.halfedge_mut(he).face = f0;
            }
            for he in [e0, h2, t1] {
                self.halfedge_mut(he).face = f1;
            }

            self.set_next(h0, h1);
            self.set_next(h1, t0);
            self.set_next(t0, h0);

            self.set_next(e0, h2);
            self.set_next(h2, t1);
            self.set_next(t1, e0);
        } else {
            let prev = self.prev(h0);
            self.set_next(prev, t1);
            self.set_next(t1, h0);
        }

        if f3.is_valid() {
            let o1 = self.next(o0);
            let o2 = self.next(o1);
            let v3 = self.dest(o1);

            let e2 = self.new_edge(v, v3);
            let t2 = e2.opposite();

            let f2 = self.new_face(o1);
            self.face_mut(f3).halfedge = o0;

            for he in [e1, o1, t2] {
                self.halfedge_mut(he).face = f2;
            }
            for he in [o0, e2, o2] {
                self.halfedge_mut(he).face = f3;
            }

            self.set_next(e1, o1);
            self.set_next(o1, t2);
            self.set_next(t2, e1);

            self.set_next(o0, e2);
            self.set_next(e2, o2);
            self.set_next(o2, o0);
        } else {
            let next = self.next(o0);
            self.set_next(e1, next);
            self.set_next(o0, e1);
            self.vertex_mut(v).halfedge = e1;
        }

        if self.vertex(a).halfedge == h0 {
            self.vertex_mut(a).halfedge = t1;
        }

        t1
    }

    /// Whether `e` can be flipped without breaking the mesh.
    ///
    /// Boundary edges cannot be flipped, and the flipped edge must not exist
    /// already.
    pub fn is_flip_ok(&self, e: EdgeId<I>) -> bool {
        if self.is_edge_on_boundary(e) {
            return false;
        }

        let v0 = self.dest(self.next(e.halfedge(0)));
        let v1 = self.dest(self.next(e.halfedge(1)));

        if v0 == v1 {
            return false;
        }

        self.find_halfedge(v0, v1).is_none()
    }

    /// Flip edge `e` so that it connects the two opposite corners.
    ///
    /// Callers must check [`is_flip_ok`](Self::is_flip_ok) first.
    pub fn flip(&mut self, e: EdgeId<I>) {
        let a0 = e.halfedge(0);
        let b0 = e.halfedge(1);

        let a1 = self.next(a0);
        let a2 = self.next(a1);
        let b1 = self.next(b0);
        let b2 = self.next(b1);

        let va0 = self.dest(a0);
        let va1 = self.dest(a1);
        let vb0 = self.dest(b0);
        let vb1 = self.dest(b1);

        let fa = self.face_of(a0);
        let fb = self.face_of(b0);

        self.halfedge_mut(a0).origin = vb1;
        self.halfedge_mut(b0).origin = va1;

        self.set_next(a0, a2);
        self.set_next(a2, b1);
        self.set_next(b1, a0);

        self.set_next(b0, b2);
        self.set_next(b2, a1);
        self.set_next(a1, b0);

        self.halfedge_mut(a1).face = fb;
        self.halfedge_mut(b1).face = fa;

        self.face_mut(fa).halfedge = a0;
        self.face_mut(fb).halfedge = b0;

        if self.vertex(va0).halfedge == b0 {
            self.vertex_mut(va0).halfedge = a1;
        }
        if self.vertex(vb0).halfedge == a0 {
            self.vertex_mut(vb0).halfedge = b1;
        }
    }

    /// Whether collapsing `h` (moving its origin onto its destination) keeps
    /// the mesh a manifold.
    pub fn is_collapse_ok(&self, h: HalfEdgeId<I>) -> bool {
        let o = h.opposite();
        let v0 = self.origin(h);
        let v1 = self.dest(h);

        // Neither side may be a triangle whose other two edges are boundary.
        let apex = |side: HalfEdgeId<I>| -> Result<Option<VertexId<I>>, ()> {
            if self.is_boundary_halfedge(side) {
                return Ok(None);
            }
            let h1 = self.next(side);
            let h2 = self.next(h1);
            if self.is_boundary_halfedge(h1.opposite()) && self.is_boundary_halfedge(h2.opposite()) {
                return Err(());
            }
            Ok(Some(self.dest(h1)))
        };

        let (vl, vr) = match (apex(h), apex(o)) {
            (Ok(vl), Ok(vr)) => (vl, vr),
            _ => return false,
        };

        if vl == vr {
            return false;
        }

        // An interior apex of valence 3 would be left with two edges, which
        // also keeps a closed surface from shrinking below a tetrahedron.
        for apex in [vl, vr].into_iter().flatten() {
            if !self.is_boundary_vertex(apex) && self.valence(apex) == 3 {
                return false;
            }
        }

        // An interior edge between two boundary vertices would pinch the surface.
        if self.is_boundary_vertex(v0)
            && self.is_boundary_vertex(v1)
            && !self.is_boundary_halfedge(h)
            && !self.is_boundary_halfedge(o)
        {
            return false;
        }

        // The one-rings may only share the two apex vertices.
        for vv in self.vertex_neighbors(v0) {
            if vv != v1 && Some(vv) != vl && Some(vv) != vr && self.find_halfedge(vv, v1).is_some() {
                return false;
            }
        }

        true
    }

    /// Collapse `h`: its origin is removed and merged into its destination.
    ///
    /// The destination keeps its position. The one or two triangles incident
    /// to the edge disappear. Removed elements are only flagged deleted until
    /// [`garbage_collection`](Self::garbage_collection). Callers must check
    /// [`is_collapse_ok`](Self::is_collapse_ok) first.
    pub fn collapse(&mut self, h: HalfEdgeId<I>) {
        let h0 = self.next(h);
        let o0 = self.next(h.opposite());

        self.remove_edge(h);

        if self.next(self.next(h0)) == h0 {
            self.remove_loop(h0);
        }
        if self.next(self.next(o0)) == o0 {
            self.remove_loop(o0);
        }
    }

    fn remove_edge(&mut self, h: HalfEdgeId<I>) {
        let hn = self.next(h);
        let hp = self.prev(h);

        let o = h.opposite();
        let on = self.next(o);
        let op = self.prev(o);

        let fh = self.face_of(h);
        let fo = self.face_of(o);

        let vh = self.dest(h);
        let vo = self.origin(h);

        let outgoing: Vec<HalfEdgeId<I>> = self.vertex_halfedges(vo).collect();
        for hc in outgoing {
            self.halfedge_mut(hc).origin = vh;
        }

        self.set_next(hp, hn);
        self.set_next(op, on);

        if fh.is_valid() {
            self.face_mut(fh).halfedge = hn;
        }
        if fo.is_valid() {
            self.face_mut(fo).halfedge = on;
        }

        if self.vertex(vh).halfedge == o {
            self.vertex_mut(vh).halfedge = hn;
        }
        self.adjust_outgoing_halfedge(vh);
        self.vertex_mut(vo).halfedge = HalfEdgeId::invalid();

        self.delete_vertex(vo);
        self.delete_edge(h.edge());
    }

    /// Remove the two-edge loop starting at `h` left behind by a collapse.
    fn remove_loop(&mut self, h: HalfEdgeId<I>) {
        let h0 = h;
        let h1 = self.next(h0);

        let o0 = h0.opposite();
        let o1 = h1.opposite();

        let v0 = self.dest(h0);
        let v1 = self.dest(h1);

        let fh = self.face_of(h0);
        let fo = self.face_of(o0);

        debug_assert!(self.next(h1) == h0 && h1 != o0);

        let after = self.next(o0);
        let before = self.prev(o0);
        self.set_next(h1, after);
        self.set_next(before, h1);

        self.halfedge_mut(h1).face = fo;

        self.vertex_mut(v0).halfedge = h1;
        self.adjust_outgoing_halfedge(v0);
        self.vertex_mut(v1).halfedge = o1;
        self.adjust_outgoing_halfedge(v1);

        if fo.is_valid() && self.face(fo).halfedge == o0 {
            self.face_mut(fo).halfedge = h1;
        }

        if fh.is_valid() {
            self.delete_face(fh);
        }
        self.delete_edge(h0.edge());
    }

    /// Point `v` at an outgoing boundary half-edge if it has one.
    fn adjust_outgoing_halfedge(&mut self, v: VertexId<I>) {
        if let Some(he) = self.vertex_halfedges(v).find(|&he| self.is_boundary_halfedge(he)) {
            self.vertex_mut(v).halfedge = he;
        }
    }

    fn delete_vertex(&mut self, v: VertexId<I>) {
        if !self.vertex_deleted[v.index()] {
            self.vertex_deleted[v.index()] = true;
            self.deleted_vertices += 1;
        }
    }

    fn delete_edge(&mut self, e: EdgeId<I>) {
        if !self.edge_deleted[e.index()] {
            self.edge_deleted[e.index()] = true;
            self.deleted_edges += 1;
        }
    }

    fn delete_face(&mut self, f: FaceId<I>) {
        if !self.face_deleted[f.index()] {
            self.face_deleted[f.index()] = true;
            self.deleted_faces += 1;
        }
    }

    /// Compact storage by dropping deleted elements.
    ///
    /// Surviving elements keep their relative order. All handles are
    /// renumbered and every attribute column is compacted alongside, so
    /// attribute values stay attached to their elements.
    pub fn garbage_collection(&mut self) {
        if !self.has_garbage() {
            return;
        }

        let vkeep: Vec<bool> = self.vertex_deleted.iter().map(|d| !d).collect();
        let ekeep: Vec<bool> = self.edge_deleted.iter().map(|d| !d).collect();
        let fkeep: Vec<bool> = self.face_deleted.iter().map(|d| !d).collect();
        let hkeep: Vec<bool> = (0..self.halfedges.len()).map(|i| ekeep[i >> 1]).collect();

        let vmap = compaction_map(&vkeep);
        let emap = compaction_map(&ekeep);
        let fmap = compaction_map(&fkeep);

        let map_vertex = |v: VertexId<I>| -> VertexId<I> {
            if v.is_valid() {
                VertexId::new(vmap[v.index()])
            } else {
                v
            }
        };
        let map_halfedge = |h: HalfEdgeId<I>| -> HalfEdgeId<I> {
            if h.is_valid() {
                HalfEdgeId::new((emap[h.index() >> 1] << 1) | (h.index() & 1))
            } else {
                h
            }
        };
        let map_face = |f: FaceId<I>| -> FaceId<I> {
            if f.is_valid() {
                FaceId::new(fmap[f.index()])
            } else {
                f
            }
        };

        retain_mask(&mut self.vertices, &vkeep);
        retain_mask(&mut self.halfedges, &hkeep);
        retain_mask(&mut self.faces, &fkeep);

        for vertex in &mut self.vertices {
            vertex.halfedge = map_halfedge(vertex.halfedge);
        }
        for he in &mut self.halfedges {
            he.origin = map_vertex(he.origin);
            he.next = map_halfedge(he.next);
            he.prev = map_halfedge(he.prev);
            he.face = map_face(he.face);
        }
        for face in &mut self.faces {
            face.halfedge = map_halfedge(face.halfedge);
        }

        self.vertex_attributes.retain(&vkeep);
        self.edge_attributes.retain(&ekeep);
        self.face_attributes.retain(&fkeep);

        self.vertex_deleted = vec![false; self.vertices.len()];
        self.edge_deleted = vec![false; self.halfedges.len() / 2];
        self.face_deleted = vec![false; self.faces.len()];
        self.deleted_vertices = 0;
        self.deleted_edges = 0;
        self.deleted_faces = 0;
    }
}

/// Old slot -> new slot for every kept slot (`usize::MAX` for dropped ones).
fn compaction_map(keep: &[bool]) -> Vec<usize> {
    let mut next = 0;
    keep.iter()
        .map(|&k| {
            if k {
                next += 1;
                next - 1
            } else {
                usize::MAX
            }
        })
        .collect()
}

fn retain_mask<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut slot = 0;
    values.retain(|_| {
        let kept = keep[slot];
        slot += 1;
        kept
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::attribute::{EdgeAttribute, VertexAttribute};
    use crate::mesh::test_meshes::{grid, single_triangle, tetrahedron};

    fn interior_edge(mesh: &HalfEdgeMesh) -> EdgeId {
        mesh.edge_ids()
            .find(|&e| !mesh.is_edge_on_boundary(e))
            .unwrap()
    }

    #[test]
    fn test_split_interior_edge() {
        let mut mesh = grid(2, 1.0);
        let (nv, ne, nf) = (mesh.num_vertices(), mesh.num_edges(), mesh.num_faces());
        let e = interior_edge(&mesh);
        let [a, b] = mesh.edge_vertices(e);
        let mid = mesh.edge_midpoint(e.halfedge(0));

        let v = mesh.split_edge_at(e, mid);

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_vertices(), nv + 1);
        assert_eq!(mesh.num_edges(), ne + 3);
        assert_eq!(mesh.num_faces(), nf + 2);
        assert_eq!(mesh.valence(v), 4);
        assert_eq!(mesh.edge_vertices(e), [v, b]);
        assert!(mesh.find_halfedge(a, v).is_some());
        assert!(mesh.find_halfedge(a, b).is_none());
    }

    #[test]
    fn test_split_boundary_edge() {
        let mut mesh = single_triangle();
        let e = EdgeId::new(0);
        let [a, b] = mesh.edge_vertices(e);

        let v = mesh.add_vertex(Point3::new(0.5, 0.0, 0.0));
        let t1 = mesh.split(e, v);

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 5);
        assert_eq!(mesh.origin(t1), a);
        assert_eq!(mesh.dest(t1), v);
        assert_eq!(mesh.edge_vertices(e), [v, b]);
        assert!(mesh.is_boundary_vertex(v));
        assert_eq!(mesh.valence(v), 3);
    }

    #[test]
    fn test_flip_quad_diagonal() {
        // Unit square split along (0, 2).
        let mut mesh = crate::mesh::test_meshes::quad();
        let e = interior_edge(&mesh);
        let [a, b] = mesh.edge_vertices(e);
        assert!(mesh.is_flip_ok(e));

        mesh.flip(e);

        assert!(mesh.is_valid());
        let [c, d] = mesh.edge_vertices(e);
        assert!(![c, d].contains(&a) && ![c, d].contains(&b));
        assert!(mesh.find_halfedge(a, b).is_none());
        for f in mesh.face_ids() {
            assert!(mesh.face_area(f) > 0.0);
        }
    }

    #[test]
    fn test_flip_rejected() {
        let mesh = single_triangle();
        assert!(mesh.edge_ids().all(|e| !mesh.is_flip_ok(e)));

        // Flipping a tetrahedron edge would duplicate the opposite edge.
        let tet = tetrahedron();
        assert!(tet.edge_ids().all(|e| !tet.is_flip_ok(e)));
    }

    #[test]
    fn test_collapse_interior_edge() {
        let mut mesh = grid(3, 1.0);
        let (nv, ne, nf) = (mesh.num_vertices(), mesh.num_edges(), mesh.num_faces());

        // Collapse the centre-ish interior vertex 5 onto its neighbour 6.
        let h = mesh
            .find_halfedge(VertexId::new(5), VertexId::new(6))
            .unwrap();
        assert!(mesh.is_collapse_ok(h));
        mesh.collapse(h);

        assert!(mesh.is_deleted_vertex(VertexId::new(5)));
        assert!(mesh.is_valid());
        assert_eq!(mesh.num_vertices(), nv - 1);
        assert_eq!(mesh.num_edges(), ne - 3);
        assert_eq!(mesh.num_faces(), nf - 2);

        mesh.garbage_collection();
        assert!(!mesh.has_garbage());
        assert!(mesh.is_valid());
        assert_eq!(mesh.vertex_slots(), nv - 1);
    }

    #[test]
    fn test_collapse_rejections() {
        let mesh = single_triangle();
        for h in mesh.halfedge_ids() {
            assert!(!mesh.is_collapse_ok(h));
        }

        // Diagonal of a quad joins two boundary vertices through the interior.
        let quad = crate::mesh::test_meshes::quad();
        let e = interior_edge(&quad);
        assert!(!quad.is_collapse_ok(e.halfedge(0)));
        assert!(!quad.is_collapse_ok(e.halfedge(1)));

        // Any collapse would fold a tetrahedron flat.
        let tet = tetrahedron();
        assert!(tet.halfedge_ids().all(|h| !tet.is_collapse_ok(h)));
    }

    #[test]
    fn test_collapse_boundary_edge() {
        let mut mesh = grid(3, 1.0);
        let h = mesh
            .find_halfedge(VertexId::new(1), VertexId::new(2))
            .unwrap();
        assert!(mesh.is_collapse_ok(h));
        mesh.collapse(h);
        assert!(mesh.is_valid());
        assert!(mesh.is_boundary_vertex(VertexId::new(2)));
        mesh.garbage_collection();
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_garbage_collection_keeps_attributes_attached() {
        let mut mesh = grid(3, 1.0);
        let original: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

        let tag: VertexAttribute<usize> = mesh.add_attribute(0);
        for v in mesh.vertex_ids().collect::<Vec<_>>() {
            mesh.set_attr(tag, v, v.index());
        }
        let lengths: EdgeAttribute<f64> = mesh.add_attribute(0.0);
        for e in mesh.edge_ids().collect::<Vec<_>>() {
            let len = mesh.edge_length(e.halfedge(0));
            mesh.set_attr(lengths, e, len);
        }

        let h = mesh
            .find_halfedge(VertexId::new(5), VertexId::new(9))
            .unwrap();
        assert!(mesh.is_collapse_ok(h));
        mesh.collapse(h);
        mesh.garbage_collection();

        assert!(mesh.is_valid());
        assert_eq!(mesh.attribute(tag).len(), mesh.num_vertices());
        for v in mesh.vertex_ids() {
            assert_eq!(*mesh.position(v), original[mesh.attr(tag, v)]);
        }
        // Surviving edges that did not touch the removed vertex keep their length.
        for e in mesh.edge_ids() {
            let [a, b] = mesh.edge_vertices(e);
            if mesh.attr(tag, a) != 9 && mesh.attr(tag, b) != 9 {
                assert!((mesh.attr(lengths, e) - mesh.edge_length(e.halfedge(0))).abs() < 1e-12);
            }
        }
    }
}
