//! Edge splitting.

use log::{trace, warn};

use crate::mesh::{EdgeId, MeshIndex};

use super::driver::Remesher;

impl<I: MeshIndex> Remesher<'_, I> {
    /// Split every edge longer than the split threshold at its midpoint,
    /// repeating until nothing changes or the pass ceiling is hit.
    pub(super) fn split_long_edges(&mut self) {
        for pass in 0..self.options.max_passes {
            let mut splits = 0;

            // Edges created during the pass are visited in the next one.
            for i in 0..self.mesh.edge_slots() {
                let e = EdgeId::new(i);
                if self.mesh.is_deleted_edge(e) || !self.can_split(e) {
                    continue;
                }

                let [v0, v1] = self.mesh.edge_vertices(e);
                if !self.is_too_long(v0, v1) {
                    continue;
                }

                // One vertex, three edges and two faces at most.
                if !self.mesh.has_capacity(1, 3, 2) {
                    self.stats.splits += splits;
                    warn!(
                        "index type exhausted at {} vertices, splitting stopped",
                        self.mesh.vertex_slots()
                    );
                    return;
                }

                let midpoint = self.mesh.edge_midpoint(e.halfedge(0));
                let sizing = self.mean_target(v0, v1);
                let is_feature = self.is_feature_edge(e);

                let v = self.mesh.add_vertex(midpoint);
                let t1 = self.mesh.split(e, v);

                self.mesh.set_attr(self.sizing, v, sizing);
                let normal = self.mesh.vertex_normal(v);
                self.mesh.set_attr(self.normal, v, normal);

                if is_feature {
                    self.mesh.set_attr(self.efeature, t1.edge(), true);
                    self.mesh.set_attr(self.vfeature, v, true);
                } else {
                    self.project_to_reference(v);
                }

                splits += 1;
            }

            self.stats.splits += splits;
            trace!("split pass {}: {} edges split", pass, splits);
            if splits == 0 {
                break;
            }
        }
    }

    /// An edge can be split when neither it nor the other edges of its
    /// triangles are locked.
    fn can_split(&self, e: EdgeId<I>) -> bool {
        if self.is_edge_locked(e) {
            return false;
        }

        [e.halfedge(0), e.halfedge(1)].into_iter().all(|h| {
            self.mesh.is_boundary_halfedge(h) || {
                let h1 = self.mesh.next(h);
                let h2 = self.mesh.next(h1);
                !self.is_edge_locked(h1.edge()) && !self.is_edge_locked(h2.edge())
            }
        })
    }
}
