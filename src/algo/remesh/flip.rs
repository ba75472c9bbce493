//! Valence-driven edge flipping.

use log::trace;

use crate::mesh::{EdgeId, MeshIndex, VertexId};

use super::driver::Remesher;

/// Ideal valence of an interior vertex.
const INTERIOR_VALENCE: i64 = 6;

/// Ideal valence of a boundary vertex.
const BOUNDARY_VALENCE: i64 = 4;

impl<I: MeshIndex> Remesher<'_, I> {
    /// Flip edges whenever that brings the four corner valences closer to
    /// their ideal, until nothing changes or the pass ceiling is hit.
    pub(super) fn flip_edges(&mut self) {
        let mut valence = vec![0_i64; self.mesh.vertex_slots()];
        for v in self.mesh.vertex_ids() {
            valence[v.index()] = self.mesh.valence(v) as i64;
        }

        for pass in 0..self.options.max_passes {
            let mut flips = 0;

            for i in 0..self.mesh.edge_slots() {
                let e = EdgeId::new(i);
                if self.mesh.is_deleted_edge(e)
                    || self.is_edge_locked(e)
                    || self.is_feature_edge(e)
                    || self.mesh.is_edge_on_boundary(e)
                {
                    continue;
                }

                let corners = self.flip_corners(e);
                if corners.iter().any(|&v| self.is_locked(v)) {
                    continue;
                }

                let [a, c, b, d] = corners;
                let deviation = |delta: [i64; 4]| -> i64 {
                    corners
                        .iter()
                        .zip(delta)
                        .map(|(&v, dv)| {
                            let diff = valence[v.index()] + dv - self.ideal_valence(v);
                            diff * diff
                        })
                        .sum()
                };

                let before = deviation([0, 0, 0, 0]);
                let after = deviation([-1, -1, 1, 1]);

                if after < before && self.mesh.is_flip_ok(e) {
                    self.mesh.flip(e);
                    valence[a.index()] -= 1;
                    valence[c.index()] -= 1;
                    valence[b.index()] += 1;
                    valence[d.index()] += 1;
                    flips += 1;
                }
            }

            self.stats.flips += flips;
            trace!("flip pass {}: {} edges flipped", pass, flips);
            if flips == 0 {
                break;
            }
        }
    }

    /// The endpoints of `e` followed by the two opposite corners.
    fn flip_corners(&self, e: EdgeId<I>) -> [VertexId<I>; 4] {
        let h0 = e.halfedge(0);
        let h1 = e.halfedge(1);
        [
            self.mesh.dest(h0),
            self.mesh.dest(h1),
            self.mesh.dest(self.mesh.next(h0)),
            self.mesh.dest(self.mesh.next(h1)),
        ]
    }

    fn ideal_valence(&self, v: VertexId<I>) -> i64 {
        if self.mesh.is_boundary_vertex(v) {
            BOUNDARY_VALENCE
        } else {
            INTERIOR_VALENCE
        }
    }
}
