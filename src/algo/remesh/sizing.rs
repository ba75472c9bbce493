//! Sizing field: the target edge length at every vertex.

use log::debug;

use crate::algo::curvature::{cotan_weight, CurvatureAnalyzer};
use crate::mesh::{EdgeId, MeshIndex};

use super::driver::Remesher;
use super::SizingMode;

/// Smoothing passes applied to curvature before it is turned into lengths.
const CURVATURE_PROPAGATION_PASSES: usize = 2;

/// Target edge length for a surface of curvature `curvature`.
///
/// The length is that of an equilateral triangle whose edges deviate at most
/// `error` from a circle of radius `1 / curvature`, clamped to
/// `[min_length, max_length]`. Flat regions get `max_length`.
///
/// ```
/// use resurface::algo::remesh::edge_length_from_curvature;
///
/// assert_eq!(edge_length_from_curvature(0.0, 0.01, 0.05, 1.0), 1.0);
/// let h = edge_length_from_curvature(1.0, 0.01, 0.05, 1.0);
/// assert!((h - (6.0 * 0.01 - 3.0 * 0.0001_f64).sqrt()).abs() < 1e-12);
/// ```
pub fn edge_length_from_curvature(curvature: f64, error: f64, min_length: f64, max_length: f64) -> f64 {
    if !(curvature.is_finite() && curvature > 0.0) {
        return max_length;
    }

    let r = 1.0 / curvature;
    let h = if error < r {
        (6.0 * error * r - 3.0 * error * error).sqrt()
    } else {
        error * 3.0 / 3.0_f64.sqrt()
    };

    h.clamp(min_length, max_length)
}

impl<I: MeshIndex> Remesher<'_, I> {
    pub(super) fn compute_sizing_field(&mut self) {
        match self.options.sizing {
            SizingMode::Uniform { target_length } => {
                let ids: Vec<_> = self.mesh.vertex_ids().collect();
                for v in ids {
                    self.mesh.set_attr(self.sizing, v, target_length);
                }
            }
            SizingMode::Adaptive {
                min_edge_length,
                max_edge_length,
                approximation_error,
            } => {
                let curvature = self.propagated_curvature();
                let ids: Vec<_> = self.mesh.vertex_ids().collect();
                for v in ids {
                    let h = edge_length_from_curvature(
                        curvature[v.index()],
                        approximation_error,
                        min_edge_length,
                        max_edge_length,
                    );
                    self.mesh.set_attr(self.sizing, v, h);
                }
                debug!(
                    "adaptive sizing field in [{}, {}]",
                    min_edge_length, max_edge_length
                );
            }
        }
    }

    /// Per-vertex curvature magnitude with boundary and feature vertices
    /// filled in from their neighbours.
    ///
    /// The tensor estimate is unreliable on boundaries and sharp features, so
    /// those vertices start out unknown (negative) and every vertex is then
    /// replaced by the cotangent-weighted mean of its known neighbours, twice.
    fn propagated_curvature(&self) -> Vec<f64> {
        let mesh = &*self.mesh;
        let features = mesh.attribute(self.vfeature);

        let mut analyzer = CurvatureAnalyzer::new(mesh).with_feature_vertices(features);
        analyzer.analyze_tensor(1, false);

        let mut curvature = vec![-1.0; mesh.vertex_slots()];
        for v in mesh.vertex_ids() {
            if !mesh.is_boundary_vertex(v) && !features[v.index()] {
                curvature[v.index()] = analyzer.max_abs_curvature(v);
            }
        }

        let cotan: Vec<f64> = (0..mesh.edge_slots())
            .map(|i| {
                let e = EdgeId::new(i);
                if mesh.is_deleted_edge(e) {
                    0.0
                } else {
                    cotan_weight(mesh, e).max(0.0)
                }
            })
            .collect();

        for _ in 0..CURVATURE_PROPAGATION_PASSES {
            for v in mesh.vertex_ids() {
                let (mut ww, mut cc) = (0.0, 0.0);
                for h in mesh.vertex_halfedges(v) {
                    let c = curvature[mesh.dest(h).index()];
                    if c > 0.0 {
                        let w = cotan[h.edge().index()];
                        ww += w;
                        cc += w * c;
                    }
                }
                curvature[v.index()] = if ww > 0.0 { cc / ww } else { 0.0 };
            }
        }

        curvature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::remesh::RemeshOptions;
    use crate::mesh::test_meshes::{grid, icosphere};

    #[test]
    fn test_edge_length_formula() {
        // Large error relative to the radius.
        let h = edge_length_from_curvature(10.0, 0.5, 0.0, 10.0);
        assert!((h - 0.5 * 3.0_f64.sqrt()).abs() < 1e-12);

        // Clamping.
        assert_eq!(edge_length_from_curvature(1000.0, 1e-6, 0.01, 1.0), 0.01);
        assert_eq!(edge_length_from_curvature(1e-9, 0.1, 0.01, 1.0), 1.0);
        assert_eq!(edge_length_from_curvature(f64::NAN, 0.1, 0.01, 1.0), 1.0);
    }

    #[test]
    fn test_adaptive_flat_grid_uses_max() {
        let mut mesh = grid(4, 0.25);
        let options = RemeshOptions::adaptive(0.01, 0.3, 0.001);
        let remesher = Remesher::new(&mut mesh, &options).unwrap();

        for v in remesher.mesh.vertex_ids() {
            assert_eq!(remesher.target_length(v), 0.3);
        }
    }

    #[test]
    fn test_adaptive_sphere_is_clamped_and_uniformish() {
        let mut mesh = icosphere(3);
        let (min, max, error) = (0.01, 1.0, 0.001);
        let options = RemeshOptions::adaptive(min, max, error);
        let remesher = Remesher::new(&mut mesh, &options).unwrap();

        // Unit sphere: expected sqrt(6e - 3e^2).
        let expected = (6.0 * error - 3.0 * error * error).sqrt();
        for v in remesher.mesh.vertex_ids() {
            let h = remesher.target_length(v);
            assert!((min..=max).contains(&h));
            assert!((h - expected).abs() < 0.3 * expected, "{} vs {}", h, expected);
        }
    }
}
