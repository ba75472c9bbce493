//! Feature detection and vertex locking.

use crate::mesh::{normalize_or_zero, EdgeAttribute, HalfEdgeMesh, MeshIndex, VertexId};

use super::driver::Remesher;

/// Mark boundary edges and edges sharper than `angle` degrees in `features`.
///
/// An interior edge is sharp when the normals of its two faces differ by at
/// least `angle`. Edges next to a degenerate face are never marked sharp.
/// Existing marks are kept. Returns the number of marked edges.
pub fn mark_feature_edges<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    angle: f64,
    features: EdgeAttribute<bool>,
) -> usize {
    let cos_angle = angle.to_radians().cos();

    let sharp: Vec<_> = mesh
        .edge_ids()
        .filter(|&e| {
            let h0 = e.halfedge(0);
            let h1 = e.halfedge(1);
            if mesh.is_boundary_halfedge(h0) || mesh.is_boundary_halfedge(h1) {
                return true;
            }

            let n0 = mesh.face_normal(mesh.face_of(h0));
            let n1 = mesh.face_normal(mesh.face_of(h1));
            if n0.norm_squared() == 0.0 || n1.norm_squared() == 0.0 {
                return false;
            }
            n0.dot(&n1) <= cos_angle
        })
        .collect();

    for &e in &sharp {
        mesh.set_attr(features, e, true);
    }

    mesh.edge_ids().filter(|&e| mesh.attr(features, e)).count()
}

impl<I: MeshIndex> Remesher<'_, I> {
    /// With a non-empty selection, lock every unselected vertex and every
    /// edge touching a locked vertex.
    pub(super) fn lock_unselected(&mut self) {
        let Some(selection) = self.options.selection else {
            return;
        };

        let selected = self.mesh.attribute(selection);
        if !self.mesh.vertex_ids().any(|v| selected[v.index()]) {
            return;
        }

        let locked: Vec<_> = self
            .mesh
            .vertex_ids()
            .filter(|&v| !selected[v.index()])
            .collect();
        for v in locked {
            self.mesh.set_attr(self.vlocked, v, true);
        }

        let locked_edges: Vec<_> = self
            .mesh
            .edge_ids()
            .filter(|&e| {
                let [a, b] = self.mesh.edge_vertices(e);
                self.is_locked(a) || self.is_locked(b)
            })
            .collect();
        for e in locked_edges {
            self.mesh.set_attr(self.elocked, e, true);
        }
    }

    /// Flag vertices on two or more feature edges, and lock the ends,
    /// junctions and sharp bends of feature lines.
    pub(super) fn mark_feature_vertices(&mut self) {
        let cos_angle = self.options.feature_angle.to_radians().cos();

        let marks: Vec<_> = self
            .mesh
            .vertex_ids()
            .map(|v| {
                let ends: Vec<_> = self
                    .mesh
                    .vertex_halfedges(v)
                    .filter(|h| self.is_feature_edge(h.edge()))
                    .map(|h| self.mesh.dest(h))
                    .collect();

                let locked = match ends[..] {
                    [a, b] => self.is_sharp_bend(v, a, b, cos_angle),
                    [_] => true,
                    _ => ends.len() > 2,
                };
                (v, ends.len() >= 2, locked)
            })
            .collect();

        for (v, feature, locked) in marks {
            if feature {
                self.mesh.set_attr(self.vfeature, v, true);
            }
            if locked {
                self.mesh.set_attr(self.vlocked, v, true);
            }
        }
    }

    /// Whether the feature line `a - v - b` turns by at least the feature angle.
    fn is_sharp_bend(&self, v: VertexId<I>, a: VertexId<I>, b: VertexId<I>, cos_angle: f64) -> bool {
        let p = self.mesh.position(v);
        let incoming = normalize_or_zero(p - self.mesh.position(a));
        let outgoing = normalize_or_zero(self.mesh.position(b) - p);
        if incoming.norm_squared() == 0.0 || outgoing.norm_squared() == 0.0 {
            return false;
        }
        incoming.dot(&outgoing) <= cos_angle
    }
}
