//! Cap removal.
//!
//! A cap is a triangle with one angle close to 180 degrees. Flipping the edge
//! opposite that angle replaces the cap pair with two better-shaped triangles.

use log::trace;

use nalgebra::Point3;

use crate::mesh::{normalize_or_zero, EdgeId, MeshIndex};

use super::driver::Remesher;

impl<I: MeshIndex> Remesher<'_, I> {
    pub(super) fn remove_caps(&mut self) {
        let min_cos = self.options.cap_angle.to_radians().cos();
        let mut removed = 0;

        for i in 0..self.mesh.edge_slots() {
            let e = EdgeId::new(i);
            if self.mesh.is_deleted_edge(e) || self.is_edge_locked(e) || !self.mesh.is_flip_ok(e) {
                continue;
            }

            let h0 = e.halfedge(0);
            let h1 = e.halfedge(1);

            // a and c are the endpoints of e; b and d the opposite corners.
            let a = self.mesh.dest(h0);
            let b = self.mesh.dest(self.mesh.next(h0));
            let c = self.mesh.dest(h1);
            let d = self.mesh.dest(self.mesh.next(h1));

            if [a, b, c, d].iter().any(|&v| self.is_locked(v)) {
                continue;
            }

            let pa = *self.mesh.position(a);
            let pc = *self.mesh.position(c);
            let cos_b = corner_cos(&pa, self.mesh.position(b), &pc);
            let cos_d = corner_cos(&pa, self.mesh.position(d), &pc);
            let (v, cos) = if cos_b < cos_d { (b, cos_b) } else { (d, cos_d) };

            if cos >= min_cos {
                continue;
            }

            let is_feature = self.is_feature_edge(e);
            if is_feature && self.is_feature(v) {
                continue;
            }

            if is_feature {
                // Move the obtuse corner onto the feature line so that the
                // two new edges can carry it.
                self.mesh.set_position(v, Point3::from((pa.coords + pc.coords) * 0.5));
            }

            self.mesh.flip(e);

            if is_feature {
                self.mesh.set_attr(self.efeature, e, false);
                for end in [a, c] {
                    if let Some(h) = self.mesh.find_halfedge(end, v) {
                        self.mesh.set_attr(self.efeature, h.edge(), true);
                    }
                }
                self.mesh.set_attr(self.vfeature, v, true);
            }

            removed += 1;
        }

        self.stats.caps_removed += removed;
        trace!("removed {} caps", removed);
    }
}

/// Cosine of the angle at `corner` in the triangle `(a, corner, c)`.
fn corner_cos(a: &Point3<f64>, corner: &Point3<f64>, c: &Point3<f64>) -> f64 {
    normalize_or_zero(a - corner).dot(&normalize_or_zero(c - corner))
}
