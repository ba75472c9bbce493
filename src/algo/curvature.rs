//! Discrete curvature estimation.
//!
//! [`CurvatureAnalyzer`] computes per-vertex principal curvatures with one of
//! two estimators:
//!
//! - [`analyze`](CurvatureAnalyzer::analyze): local analytic operators. Mean
//!   curvature comes from the cotangent Laplacian, Gaussian curvature from the
//!   angle defect, both normalised by the mixed Voronoi area.
//! - [`analyze_tensor`](CurvatureAnalyzer::analyze_tensor): a curvature
//!   tensor accumulated from dihedral angles around each vertex and
//!   diagonalised.
//!
//! Both finish with a few cotangent-weighted smoothing passes of the
//! curvature field. Degenerate triangles contribute nothing; no estimate is
//! ever NaN or infinite.
//!
//! # Example
//!
//! ```no_run
//! use resurface::prelude::*;
//! use resurface::algo::curvature::CurvatureAnalyzer;
//!
//! # fn load() -> HalfEdgeMesh { unimplemented!() }
//! let mesh: HalfEdgeMesh = load();
//!
//! let mut curvature = CurvatureAnalyzer::new(&mesh);
//! curvature.analyze_tensor(1, false);
//!
//! for v in mesh.vertex_ids() {
//!     println!("{:?}: {}", v, curvature.max_abs_curvature(v));
//! }
//! ```
//!
//! # References
//!
//! - Meyer, M., et al. (2003). "Discrete Differential-Geometry Operators for
//!   Triangulated 2-Manifolds." Visualization and Mathematics III.
//! - Cohen-Steiner, D., & Morvan, J.-M. (2003). "Restricted Delaunay
//!   triangulations and normal cycle." Symposium on Computational Geometry.

use std::f64::consts::PI;

use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use rayon::prelude::*;

use crate::mesh::{EdgeId, FaceId, HalfEdgeMesh, MeshIndex, VertexId};

/// Bound on |cot| (angles clamped to roughly [3°, 177°]).
const COT_BOUND: f64 = 19.1;

/// Bound on |cos| (angles clamped to roughly [3°, 177°]).
const COS_BOUND: f64 = 0.9986;

#[inline]
fn clamp_cot(v: f64) -> f64 {
    v.clamp(-COT_BOUND, COT_BOUND)
}

#[inline]
fn clamp_cos(v: f64) -> f64 {
    v.clamp(-COS_BOUND, COS_BOUND)
}

/// Cotangent weight of an edge: the sum of the clamped cotangents of the
/// angles opposite to it in its (one or two) incident triangles.
pub fn cotan_weight<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, e: EdgeId<I>) -> f64 {
    let h0 = e.halfedge(0);
    let h1 = e.halfedge(1);
    let p0 = mesh.position(mesh.dest(h0));
    let p1 = mesh.position(mesh.dest(h1));

    let mut weight = 0.0;
    for h in [h0, h1] {
        if mesh.is_boundary_halfedge(h) {
            continue;
        }
        let p2 = mesh.position(mesh.dest(mesh.next(h)));
        let d0 = p0 - p2;
        let d1 = p1 - p2;
        let area = d0.cross(&d1).norm();
        if area > f64::MIN_POSITIVE {
            weight += clamp_cot(d0.dot(&d1) / area);
        }
    }
    weight
}

/// Mixed Voronoi area of a vertex.
///
/// Non-obtuse triangles contribute their Voronoi region; a triangle obtuse at
/// the vertex contributes half its area, one obtuse elsewhere a quarter.
pub fn voronoi_area<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> f64 {
    let mut area = 0.0;

    for h in mesh.vertex_halfedges(v) {
        if mesh.is_boundary_halfedge(h) {
            continue;
        }

        let p = mesh.position(v);
        let q = mesh.position(mesh.dest(h));
        let r = mesh.position(mesh.dest(mesh.next(h)));

        let pq = q - p;
        let qr = r - q;
        let pr = r - p;

        // Twice the triangle area.
        let tri_area = pq.cross(&pr).norm();
        if tri_area <= f64::MIN_POSITIVE {
            continue;
        }

        let dot_p = pq.dot(&pr);
        let dot_q = -qr.dot(&pq);
        let dot_r = qr.dot(&pr);

        if dot_p < 0.0 {
            area += 0.25 * tri_area;
        } else if dot_q < 0.0 || dot_r < 0.0 {
            area += 0.125 * tri_area;
        } else {
            let cot_q = clamp_cot(dot_q / tri_area);
            let cot_r = clamp_cot(dot_r / tri_area);
            area += 0.125 * (pr.norm_squared() * cot_q + pq.norm_squared() * cot_r);
        }
    }

    area
}

/// Sum of the interior angles incident to a vertex.
fn angle_sum<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> f64 {
    let p = mesh.position(v);
    mesh.vertex_halfedges(v)
        .filter(|&h| !mesh.is_boundary_halfedge(h))
        .map(|h| {
            let a = mesh.position(mesh.dest(h)) - p;
            let b = mesh.position(mesh.dest(mesh.next(h))) - p;
            let (la, lb) = (a.norm(), b.norm());
            if la * lb > f64::MIN_POSITIVE {
                clamp_cos(a.dot(&b) / (la * lb)).acos()
            } else {
                0.0
            }
        })
        .sum()
}

/// Per-vertex principal curvature estimator.
///
/// Values are indexed by vertex slot and default to zero until one of the
/// `analyze*` methods has run. Deleted and isolated vertices always read zero.
#[derive(Debug, Clone)]
pub struct CurvatureAnalyzer<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    features: Option<&'a [bool]>,
    parallel: bool,
    min_curvature: Vec<f64>,
    max_curvature: Vec<f64>,
}

impl<'a, I: MeshIndex> CurvatureAnalyzer<'a, I> {
    /// Create an analyzer for `mesh`.
    pub fn new(mesh: &'a HalfEdgeMesh<I>) -> Self {
        let n = mesh.vertex_slots();
        Self {
            mesh,
            features: None,
            parallel: true,
            min_curvature: vec![0.0; n],
            max_curvature: vec![0.0; n],
        }
    }

    /// Exclude feature vertices (indexed by vertex slot) from smoothing.
    pub fn with_feature_vertices(mut self, features: &'a [bool]) -> Self {
        self.features = Some(features);
        self
    }

    /// Set whether per-vertex passes run on the rayon thread pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Minimum principal curvature at `v`.
    #[inline]
    pub fn min_curvature(&self, v: VertexId<I>) -> f64 {
        self.min_curvature[v.index()]
    }

    /// Maximum principal curvature at `v`.
    #[inline]
    pub fn max_curvature(&self, v: VertexId<I>) -> f64 {
        self.max_curvature[v.index()]
    }

    /// Mean curvature `(kmin + kmax) / 2` at `v`.
    #[inline]
    pub fn mean_curvature(&self, v: VertexId<I>) -> f64 {
        0.5 * (self.min_curvature(v) + self.max_curvature(v))
    }

    /// Gaussian curvature `kmin * kmax` at `v`.
    #[inline]
    pub fn gaussian_curvature(&self, v: VertexId<I>) -> f64 {
        self.min_curvature(v) * self.max_curvature(v)
    }

    /// Largest absolute principal curvature at `v`.
    #[inline]
    pub fn max_abs_curvature(&self, v: VertexId<I>) -> f64 {
        self.min_curvature(v).abs().max(self.max_curvature(v).abs())
    }

    fn is_feature(&self, v: VertexId<I>) -> bool {
        self.features
            .and_then(|f| f.get(v.index()).copied())
            .unwrap_or(false)
    }

    /// Evaluate `f` for every vertex slot; deleted vertices get the default.
    fn per_vertex<T, F>(&self, f: F) -> Vec<T>
    where
        T: Default + Send,
        F: Fn(VertexId<I>) -> T + Sync + Send,
    {
        let mesh = self.mesh;
        let eval = |i: usize| {
            let v = VertexId::new(i);
            if mesh.is_deleted_vertex(v) {
                T::default()
            } else {
                f(v)
            }
        };

        let n = mesh.vertex_slots();
        if self.parallel {
            (0..n).into_par_iter().map(eval).collect()
        } else {
            (0..n).map(eval).collect()
        }
    }

    /// Evaluate `f` for every edge slot; deleted edges get the default.
    fn per_edge<T, F>(&self, f: F) -> Vec<T>
    where
        T: Default + Send,
        F: Fn(EdgeId<I>) -> T + Sync + Send,
    {
        let mesh = self.mesh;
        let eval = |i: usize| {
            let e = EdgeId::new(i);
            if mesh.is_deleted_edge(e) {
                T::default()
            } else {
                f(e)
            }
        };

        let n = mesh.edge_slots();
        if self.parallel {
            (0..n).into_par_iter().map(eval).collect()
        } else {
            (0..n).map(eval).collect()
        }
    }

    /// Local analytic estimate followed by `smoothing_steps` smoothing passes.
    ///
    /// Boundary vertices, where the angle defect is meaningless, take the
    /// cotangent-weighted average of their interior neighbours.
    pub fn analyze(&mut self, smoothing_steps: usize) {
        let mesh = self.mesh;
        let cotan = self.per_edge(|e| cotan_weight(mesh, e));

        let interior: Vec<(f64, f64)> = self.per_vertex(|v| {
            if mesh.is_isolated(v) || mesh.is_boundary_vertex(v) {
                return (0.0, 0.0);
            }

            let area = voronoi_area(mesh, v);
            if area <= f64::MIN_POSITIVE {
                return (0.0, 0.0);
            }

            let p = mesh.position(v);
            let mut laplace = Vector3::zeros();
            for h in mesh.vertex_halfedges(v) {
                laplace += (mesh.position(mesh.dest(h)) - p) * cotan[h.edge().index()];
            }
            laplace /= 2.0 * area;

            let mean = 0.5 * laplace.norm();
            let gauss = (2.0 * PI - angle_sum(mesh, v)) / area;
            let s = (mean * mean - gauss).max(0.0).sqrt();
            (mean - s, mean + s)
        });

        let values: Vec<(f64, f64)> = self.per_vertex(|v| {
            if !mesh.is_boundary_vertex(v) || mesh.is_isolated(v) {
                return interior[v.index()];
            }

            let (mut kmin, mut kmax, mut sum) = (0.0, 0.0, 0.0);
            for h in mesh.vertex_halfedges(v) {
                let n = mesh.dest(h);
                if mesh.is_boundary_vertex(n) {
                    continue;
                }
                let w = cotan[h.edge().index()];
                sum += w;
                kmin += w * interior[n.index()].0;
                kmax += w * interior[n.index()].1;
            }
            if sum.abs() > f64::MIN_POSITIVE {
                (kmin / sum, kmax / sum)
            } else {
                (0.0, 0.0)
            }
        });

        self.store(values);
        self.smooth_curvatures(smoothing_steps, &cotan);
    }

    /// Curvature-tensor estimate followed by `smoothing_steps` smoothing passes.
    ///
    /// With `two_ring`, the tensor of each vertex also accumulates the edges
    /// around its direct neighbours.
    pub fn analyze_tensor(&mut self, smoothing_steps: usize, two_ring: bool) {
        let mesh = self.mesh;

        let area = self.per_vertex(|v| voronoi_area(mesh, v));

        let face_normals: Vec<Vector3<f64>> = (0..mesh.face_slots())
            .map(|i| {
                let f = FaceId::new(i);
                if mesh.is_deleted_face(f) {
                    Vector3::zeros()
                } else {
                    mesh.face_normal(f)
                }
            })
            .collect();

        // (signed dihedral angle, sqrt(l / 2) * direction) per edge
        let edge_terms: Vec<(f64, Vector3<f64>)> = self.per_edge(|e| {
            let h0 = e.halfedge(0);
            let h1 = e.halfedge(1);
            if mesh.is_boundary_halfedge(h0) || mesh.is_boundary_halfedge(h1) {
                return (0.0, Vector3::zeros());
            }

            let n0 = face_normals[mesh.face_of(h0).index()];
            let n1 = face_normals[mesh.face_of(h1).index()];
            let ev = mesh.edge_vector(h0);
            let l = ev.norm();
            if l <= f64::MIN_POSITIVE {
                return (0.0, Vector3::zeros());
            }
            let dir = ev / l;

            let angle = n0.cross(&n1).dot(&dir).atan2(n0.dot(&n1));
            (angle, dir * (0.5 * l).sqrt())
        });

        let values: Vec<(f64, f64)> = self.per_vertex(|v| {
            if mesh.is_isolated(v) {
                return (0.0, 0.0);
            }

            let mut neighborhood = vec![v];
            if two_ring {
                neighborhood.extend(mesh.vertex_neighbors(v));
            }

            let mut tensor = Matrix3::zeros();
            let mut total_area = 0.0;
            for &u in &neighborhood {
                for h in mesh.vertex_halfedges(u) {
                    let (beta, ev) = edge_terms[h.edge().index()];
                    tensor += ev * ev.transpose() * beta;
                }
                total_area += area[u.index()];
            }

            if total_area <= f64::MIN_POSITIVE {
                return (0.0, 0.0);
            }
            tensor /= total_area;

            principal_from_tensor(tensor)
        });

        self.store(values);

        let cotan = self.per_edge(|e| cotan_weight(mesh, e));
        self.smooth_curvatures(smoothing_steps, &cotan);
    }

    fn store(&mut self, values: Vec<(f64, f64)>) {
        let (min, max): (Vec<f64>, Vec<f64>) = values.into_iter().unzip();
        self.min_curvature = min;
        self.max_curvature = max;
    }

    /// Gauss-Seidel smoothing of the curvature field.
    ///
    /// Feature vertices keep their value and never contribute to their
    /// neighbours. Negative cotangent weights are clamped to zero.
    fn smooth_curvatures(&mut self, iterations: usize, cotan: &[f64]) {
        let mesh = self.mesh;

        for _ in 0..iterations {
            for v in mesh.vertex_ids() {
                if self.is_feature(v) {
                    continue;
                }

                let (mut kmin, mut kmax, mut ww) = (0.0, 0.0, 0.0);
                for h in mesh.vertex_halfedges(v) {
                    let n = mesh.dest(h);
                    if self.is_feature(n) {
                        continue;
                    }
                    let w = cotan[h.edge().index()].max(0.0);
                    ww += w;
                    kmin += w * self.min_curvature[n.index()];
                    kmax += w * self.max_curvature[n.index()];
                }

                if ww > f64::MIN_POSITIVE {
                    self.min_curvature[v.index()] = kmin / ww;
                    self.max_curvature[v.index()] = kmax / ww;
                }
            }
        }
    }
}

/// Principal curvatures of a curvature tensor.
///
/// The eigenvalue of smallest magnitude belongs to the normal direction and
/// is dropped; the other two are returned as `(kmin, kmax)`.
fn principal_from_tensor(tensor: Matrix3<f64>) -> (f64, f64) {
    let Some(eigen) = SymmetricEigen::try_new(tensor, f64::EPSILON, 0) else {
        return (0.0, 0.0);
    };

    let ev = eigen.eigenvalues;
    if !ev.iter().all(|x| x.is_finite()) {
        return (0.0, 0.0);
    }

    let normal = ev.iamin();
    let mut rest = (0..3).filter(|&i| i != normal).map(|i| ev[i]);
    match (rest.next(), rest.next()) {
        (Some(a), Some(b)) => (a.min(b), a.max(b)),
        _ => (0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{cube, grid, icosphere, single_triangle};
    use nalgebra::Point3;

    #[test]
    fn test_flat_grid_has_zero_curvature() {
        let mesh = grid(4, 0.25);

        let mut analytic = CurvatureAnalyzer::new(&mesh);
        analytic.analyze(1);
        let mut tensor = CurvatureAnalyzer::new(&mesh);
        tensor.analyze_tensor(1, true);

        for v in mesh.vertex_ids() {
            assert!(analytic.max_abs_curvature(v) < 1e-9, "analytic {:?}", v);
            assert!(tensor.max_abs_curvature(v) < 1e-9, "tensor {:?}", v);
        }
    }

    #[test]
    fn test_unit_sphere_analytic() {
        let mesh = icosphere(3);
        let mut curvature = CurvatureAnalyzer::new(&mesh);
        curvature.analyze(0);

        for v in mesh.vertex_ids() {
            let h = curvature.mean_curvature(v);
            assert!((h - 1.0).abs() < 0.1, "vertex {:?}: {}", v, h);
            assert!(curvature.min_curvature(v) <= curvature.max_curvature(v));
            assert!(curvature.gaussian_curvature(v) > 0.0);
        }
    }

    /// Upper half of the unit sphere as a latitude-longitude mesh, open at
    /// the equator.
    fn hemisphere(rings: usize, segments: usize) -> HalfEdgeMesh {
        let mut vertices = vec![Point3::new(0.0, 0.0, 1.0)];
        for k in 1..=rings {
            let theta = k as f64 * std::f64::consts::FRAC_PI_2 / rings as f64;
            for j in 0..segments {
                let phi = j as f64 * 2.0 * PI / segments as f64;
                vertices.push(Point3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                ));
            }
        }

        let ring = |k: usize, j: usize| 1 + (k - 1) * segments + j % segments;
        let mut faces = Vec::new();
        for j in 0..segments {
            faces.push([0, ring(1, j), ring(1, j + 1)]);
        }
        for k in 1..rings {
            for j in 0..segments {
                let (a, b) = (ring(k, j), ring(k, j + 1));
                let (c, d) = (ring(k + 1, j + 1), ring(k + 1, j));
                faces.push([a, d, c]);
                faces.push([a, c, b]);
            }
        }
        crate::mesh::build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_boundary_averages_interior_neighbours() {
        let mesh = hemisphere(8, 32);
        let mut curvature = CurvatureAnalyzer::new(&mesh);
        curvature.analyze(0);

        let boundary: Vec<_> = mesh
            .vertex_ids()
            .filter(|&v| mesh.is_boundary_vertex(v))
            .collect();
        assert_eq!(boundary.len(), 32);
        for v in boundary {
            let h = curvature.mean_curvature(v);
            assert!((h - 1.0).abs() < 0.1, "vertex {:?}: {}", v, h);
            assert!(curvature.min_curvature(v) > 0.0);
        }
    }

    #[test]
    fn test_unit_sphere_tensor() {
        let mesh = icosphere(3);
        let mut curvature = CurvatureAnalyzer::new(&mesh);
        curvature.analyze_tensor(1, false);

        for v in mesh.vertex_ids() {
            let k = curvature.max_abs_curvature(v);
            assert!((k - 1.0).abs() < 0.3, "vertex {:?}: {}", v, k);
        }
    }

    #[test]
    fn test_voronoi_areas_partition_surface() {
        let mesh = icosphere(2);
        let total: f64 = mesh.vertex_ids().map(|v| voronoi_area(&mesh, v)).sum();
        assert!((total - mesh.surface_area()).abs() < 1e-9 * mesh.surface_area().max(1.0) + 1e-6);
    }

    #[test]
    fn test_cotan_weight_right_isoceles() {
        let mesh = single_triangle();
        // Edge (1, 2) is opposite the right angle: cot(90°) = 0.
        let h = mesh
            .find_halfedge(VertexId::new(1), VertexId::new(2))
            .unwrap();
        assert!(cotan_weight(&mesh, h.edge()).abs() < 1e-12);

        // Edge (0, 1) is opposite a 45° angle.
        let h = mesh
            .find_halfedge(VertexId::new(0), VertexId::new(1))
            .unwrap();
        assert!((cotan_weight(&mesh, h.edge()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = icosphere(2);

        let mut par = CurvatureAnalyzer::new(&mesh);
        par.analyze_tensor(2, true);
        let mut seq = CurvatureAnalyzer::new(&mesh).with_parallel(false);
        seq.analyze_tensor(2, true);

        for v in mesh.vertex_ids() {
            assert_eq!(par.min_curvature(v), seq.min_curvature(v));
            assert_eq!(par.max_curvature(v), seq.max_curvature(v));
        }
    }

    #[test]
    fn test_feature_vertices_are_not_smoothed() {
        let mesh = cube(2, 1.0);
        let corner = mesh
            .vertex_ids()
            .find(|&v| *mesh.position(v) == Point3::new(0.0, 0.0, 0.0))
            .unwrap();

        let mut features = vec![false; mesh.vertex_slots()];
        features[corner.index()] = true;

        let mut raw = CurvatureAnalyzer::new(&mesh);
        raw.analyze_tensor(0, false);
        let mut smoothed = CurvatureAnalyzer::new(&mesh).with_feature_vertices(&features);
        smoothed.analyze_tensor(3, false);

        assert_eq!(raw.max_curvature(corner), smoothed.max_curvature(corner));
        assert_eq!(raw.min_curvature(corner), smoothed.min_curvature(corner));
    }

    #[test]
    fn test_degenerate_geometry_is_finite() {
        let mut mesh = grid(3, 1.0);
        // Squash two rows onto each other.
        for i in 0..4 {
            let v = VertexId::new(4 + i);
            let p = *mesh.position(VertexId::new(i));
            mesh.set_position(v, p);
        }

        let mut analytic = CurvatureAnalyzer::new(&mesh);
        analytic.analyze(2);
        let mut tensor = CurvatureAnalyzer::new(&mesh);
        tensor.analyze_tensor(2, true);

        for v in mesh.vertex_ids() {
            for k in [
                analytic.min_curvature(v),
                analytic.max_curvature(v),
                tensor.min_curvature(v),
                tensor.max_curvature(v),
            ] {
                assert!(k.is_finite());
            }
        }
    }

    #[test]
    fn test_principal_from_tensor_drops_normal() {
        let t = Matrix3::from_diagonal(&Vector3::new(2.0, 0.0, -1.0));
        assert_eq!(principal_from_tensor(t), (-1.0, 2.0));
    }
}
