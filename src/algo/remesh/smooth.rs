//! Tangential smoothing.

use nalgebra::{Point3, Vector3};

use crate::mesh::{normalize_or_zero, MeshIndex, VertexId};

use super::driver::Remesher;

impl<I: MeshIndex> Remesher<'_, I> {
    /// Relax free vertices within their tangent plane.
    ///
    /// Regular vertices move towards the sizing-weighted centroid of their
    /// faces; feature vertices slide along their feature line. All updates of
    /// one sub-iteration are computed before any is applied.
    pub(super) fn tangential_smoothing(&mut self) {
        if self.reference.is_some() {
            self.project_free_vertices();
        }

        for _ in 0..self.options.smoothing_iterations {
            let updates: Vec<(VertexId<I>, Vector3<f64>)> = self
                .mesh
                .vertex_ids()
                .filter(|&v| !self.mesh.is_boundary_vertex(v) && !self.is_locked(v))
                .filter_map(|v| {
                    let u = if self.is_feature(v) {
                        self.feature_update(v)?
                    } else {
                        self.tangential_update(v)?
                    };
                    Some((v, u))
                })
                .collect();

            for (v, u) in updates {
                let p = self.mesh.position(v) + u;
                self.mesh.set_position(v, p);
            }

            self.update_normals();
        }

        if self.reference.is_some() {
            self.project_free_vertices();
        }
    }

    fn project_free_vertices(&mut self) {
        let free: Vec<_> = self
            .mesh
            .vertex_ids()
            .filter(|&v| !self.mesh.is_boundary_vertex(v) && !self.is_locked(v))
            .collect();
        for v in free {
            self.project_to_reference(v);
        }
    }

    /// Displacement along the feature line through `v`, or `None` unless `v`
    /// has exactly two feature neighbours.
    fn feature_update(&self, v: VertexId<I>) -> Option<Vector3<f64>> {
        let p = self.mesh.position(v);

        let mut ends = self
            .mesh
            .vertex_halfedges(v)
            .filter(|h| self.is_feature_edge(h.edge()))
            .map(|h| self.mesh.dest(h));
        let (a, b) = (ends.next()?, ends.next()?);
        if ends.next().is_some() {
            return None;
        }

        let mut centre = Vector3::zeros();
        let mut ww = 0.0;
        for n in [a, b] {
            let q = self.mesh.position(n);
            let w = (q - p).norm() / self.mean_target(v, n);
            centre += w * (p.coords + q.coords) * 0.5;
            ww += w;
        }
        if ww <= 0.0 {
            return None;
        }

        let tangent = feature_tangent(p, self.mesh.position(a), self.mesh.position(b));
        let u = centre / ww - p.coords;
        Some(tangent * u.dot(&tangent))
    }

    /// Displacement towards the area-and-sizing-weighted centroid of the
    /// incident faces, with the normal component removed.
    fn tangential_update(&self, v: VertexId<I>) -> Option<Vector3<f64>> {
        let centroid = self.weighted_centroid(v)?;
        let u = centroid - self.mesh.position(v);
        let n = self.mesh.attr(self.normal, v);
        Some(u - n * u.dot(&n))
    }

    fn weighted_centroid(&self, v: VertexId<I>) -> Option<Point3<f64>> {
        let mut centre = Vector3::zeros();
        let mut ww = 0.0;

        for f in self.mesh.vertex_faces(v) {
            let area = self.mesh.face_area(f);
            if area <= 0.0 {
                continue;
            }
            let [a, b, c] = self.mesh.face_triangle(f);
            let sizing = (self.target_length(a) + self.target_length(b) + self.target_length(c)) / 3.0;
            let w = area / (sizing * sizing);

            centre += w * self.mesh.face_centroid(f).coords;
            ww += w;
        }

        if ww > 0.0 && ww.is_finite() {
            Some(Point3::from(centre / ww))
        } else {
            None
        }
    }
}

/// Unit tangent at `p` of the polyline `a - p - b`, from the difference of
/// the unit directions towards both neighbours.
fn feature_tangent(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> Vector3<f64> {
    normalize_or_zero(normalize_or_zero(a - p) - normalize_or_zero(b - p))
}
