//! Edge collapsing.

use log::trace;

use crate::mesh::{EdgeId, HalfEdgeId, MeshIndex};

use super::driver::Remesher;

impl<I: MeshIndex> Remesher<'_, I> {
    /// Collapse edges shorter than the collapse threshold, repeating until
    /// nothing changes or the pass ceiling is hit. Deleted elements are
    /// compacted afterwards.
    pub(super) fn collapse_short_edges(&mut self) {
        for pass in 0..self.options.max_passes {
            let mut collapses = 0;

            for i in 0..self.mesh.edge_slots() {
                let e = EdgeId::new(i);
                if self.mesh.is_deleted_edge(e) || self.is_edge_locked(e) {
                    continue;
                }

                let h01 = e.halfedge(0);
                let h10 = e.halfedge(1);
                let v0 = self.mesh.origin(h01);
                let v1 = self.mesh.dest(h01);
                if !self.is_too_short(v0, v1) {
                    continue;
                }

                let ok01 = self.is_collapse_allowed(h01);
                let ok10 = self.is_collapse_allowed(h10);

                let h = match (ok01, ok10) {
                    (true, true) if self.mesh.valence(v0) < self.mesh.valence(v1) => h01,
                    (true, true) => h10,
                    (true, false) => h01,
                    (false, true) => h10,
                    (false, false) => continue,
                };

                if self.creates_long_edge(h) {
                    continue;
                }

                self.collapse(h);
                collapses += 1;
            }

            self.stats.collapses += collapses;
            trace!("collapse pass {}: {} edges collapsed", pass, collapses);
            if collapses == 0 {
                break;
            }
        }

        self.mesh.garbage_collection();
    }

    /// Boundary, lock, feature and topology rules for collapsing the origin
    /// of `h` into its destination.
    fn is_collapse_allowed(&self, h: HalfEdgeId<I>) -> bool {
        let e = h.edge();
        let v0 = self.mesh.origin(h);
        let v1 = self.mesh.dest(h);

        if self.is_locked(v0) || self.is_locked(v1) {
            return false;
        }

        // Boundary vertices only slide along the boundary.
        let b0 = self.mesh.is_boundary_vertex(v0);
        let b1 = self.mesh.is_boundary_vertex(v1);
        if b0 && !(b1 && self.mesh.is_edge_on_boundary(e)) {
            return false;
        }

        // Feature vertices only slide along a feature line, and never swallow
        // another feature edge.
        if self.is_feature(v0) {
            if !(self.is_feature(v1) && self.is_feature_edge(e)) {
                return false;
            }
            if self
                .removed_side_edges(h)
                .any(|side| self.is_feature_edge(side))
            {
                return false;
            }
        }

        // Locked edges around the removed vertex would be dragged along.
        if self
            .mesh
            .vertex_halfedges(v0)
            .any(|out| self.is_edge_locked(out.edge()))
        {
            return false;
        }
        if self
            .side_triangles(h)
            .any(|side| self.is_edge_locked(self.mesh.prev(side).edge()))
        {
            return false;
        }

        self.mesh.is_collapse_ok(h)
    }

    /// The non-boundary half-edges `h` and `opposite(h)`.
    fn side_triangles(&self, h: HalfEdgeId<I>) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        [h, h.opposite()]
            .into_iter()
            .filter(|&side| !self.mesh.is_boundary_halfedge(side))
    }

    /// Edges deleted together with the triangles of `h`.
    fn removed_side_edges(&self, h: HalfEdgeId<I>) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.side_triangles(h)
            .map(|side| self.mesh.next(side).edge())
    }

    /// Whether collapsing `h` would leave an edge at the destination above
    /// the split threshold.
    fn creates_long_edge(&self, h: HalfEdgeId<I>) -> bool {
        let v0 = self.mesh.origin(h);
        let v1 = self.mesh.dest(h);
        self.mesh
            .vertex_neighbors(v0)
            .filter(|&n| n != v1)
            .any(|n| self.is_too_long(v1, n))
    }

    /// Collapse `h` and carry the feature flag of each deleted side edge
    /// over to the edge that replaces it.
    fn collapse(&mut self, h: HalfEdgeId<I>) {
        let transfers: Vec<_> = self
            .side_triangles(h)
            .map(|side| {
                let removed = self.mesh.next(side).edge();
                let kept = self.mesh.prev(side).edge();
                (kept, self.is_feature_edge(removed))
            })
            .collect();

        self.mesh.collapse(h);

        for (kept, feature) in transfers {
            if feature {
                self.mesh.set_attr(self.efeature, kept, true);
            }
        }
    }
}
