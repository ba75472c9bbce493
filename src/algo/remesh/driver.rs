//! Remeshing state: transient attributes, the reference surface and the
//! iteration loop. The local operators live in sibling modules as further
//! `impl` blocks on [`Remesher`].

use log::{debug, info, trace, warn};
use nalgebra::Vector3;

use crate::algo::projection::ReferenceSurface;
use crate::algo::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{EdgeAttribute, EdgeId, HalfEdgeMesh, MeshIndex, VertexAttribute, VertexId};

use super::{RemeshOptions, RemeshStats};

/// Sub-steps reported per iteration: split, collapse, flip, smooth.
const STEPS_PER_ITERATION: usize = 4;

/// One remeshing run over a mutably borrowed mesh.
///
/// All transient attributes are created in [`Remesher::new`] and removed when
/// the remesher is dropped, whichever way the run ends.
pub(crate) struct Remesher<'m, I: MeshIndex> {
    pub(super) mesh: &'m mut HalfEdgeMesh<I>,
    pub(super) options: RemeshOptions,

    pub(super) normal: VertexAttribute<Vector3<f64>>,
    pub(super) sizing: VertexAttribute<f64>,
    pub(super) vlocked: VertexAttribute<bool>,
    pub(super) vfeature: VertexAttribute<bool>,
    pub(super) elocked: EdgeAttribute<bool>,
    pub(super) efeature: EdgeAttribute<bool>,
    owns_efeature: bool,

    pub(super) reference: Option<ReferenceSurface<I>>,
    pub(super) stats: RemeshStats,
}

impl<'m, I: MeshIndex> Remesher<'m, I> {
    /// Validate the options against `mesh` and run preprocessing.
    pub(crate) fn new(mesh: &'m mut HalfEdgeMesh<I>, options: &RemeshOptions) -> Result<Self> {
        options.validate()?;
        if let Some(selection) = options.selection {
            if !mesh.has_attribute(selection) {
                return Err(MeshError::MissingAttribute { what: "selection" });
            }
        }
        if let Some(features) = options.feature_edges {
            if !mesh.has_attribute(features) {
                return Err(MeshError::MissingAttribute {
                    what: "feature edge",
                });
            }
        }

        mesh.garbage_collection();

        let stats = RemeshStats {
            vertices_before: mesh.num_vertices(),
            faces_before: mesh.num_faces(),
            ..RemeshStats::default()
        };

        let (efeature, owns_efeature) = match options.feature_edges {
            Some(features) => (features, false),
            None => (mesh.add_attribute(false), true),
        };

        let normal = mesh.add_attribute(Vector3::zeros());
        let sizing = mesh.add_attribute(0.0);
        let vlocked = mesh.add_attribute(false);
        let vfeature = mesh.add_attribute(false);
        let elocked = mesh.add_attribute(false);

        let mut remesher = Self {
            mesh,
            options: options.clone(),
            normal,
            sizing,
            vlocked,
            vfeature,
            elocked,
            efeature,
            owns_efeature,
            reference: None,
            stats,
        };
        remesher.preprocess();
        Ok(remesher)
    }

    fn preprocess(&mut self) {
        self.lock_unselected();
        if self.options.detect_features {
            let marked = super::mark_feature_edges(self.mesh, self.options.feature_angle, self.efeature);
            debug!("marked {} feature edges", marked);
        }
        self.mark_feature_vertices();
        self.compute_sizing_field();
        self.update_normals();

        if self.options.use_projection {
            let mesh = &*self.mesh;
            let sizing = mesh.attribute(self.sizing);
            self.reference = Some(ReferenceSurface::new(mesh, |v| sizing[v.index()]));
        }
    }

    /// Run the iteration loop and the cap removal.
    pub(crate) fn run(mut self, progress: Option<&Progress>) -> RemeshStats {
        info!(
            "remeshing {} vertices / {} faces, {} iterations",
            self.stats.vertices_before, self.stats.faces_before, self.options.iterations
        );

        let total_steps = self.options.iterations * STEPS_PER_ITERATION + 1;

        for iteration in 0..self.options.iterations {
            let base = iteration * STEPS_PER_ITERATION;
            let before = self.stats;

            report(progress, base, total_steps, "Splitting long edges");
            self.split_long_edges();
            self.update_normals();
            self.check_valid("split");

            report(progress, base + 1, total_steps, "Collapsing short edges");
            self.collapse_short_edges();
            self.check_valid("collapse");

            report(progress, base + 2, total_steps, "Flipping edges");
            self.flip_edges();
            self.check_valid("flip");

            report(progress, base + 3, total_steps, "Smoothing");
            self.tangential_smoothing();
            self.check_valid("smoothing");

            self.stats.iterations += 1;
            debug!(
                "iteration {}: {} splits, {} collapses, {} flips, {} vertices",
                iteration,
                self.stats.splits - before.splits,
                self.stats.collapses - before.collapses,
                self.stats.flips - before.flips,
                self.mesh.num_vertices()
            );
        }

        report(progress, total_steps - 1, total_steps, "Removing caps");
        self.remove_caps();
        self.check_valid("cap removal");

        self.mesh.garbage_collection();
        self.stats.vertices_after = self.mesh.num_vertices();
        self.stats.faces_after = self.mesh.num_faces();

        report(progress, total_steps, total_steps, "Remeshing complete");
        info!("remeshing done: {}", self.stats);
        self.stats
    }

    #[inline]
    pub(super) fn target_length(&self, v: VertexId<I>) -> f64 {
        self.mesh.attr(self.sizing, v)
    }

    /// Mean of the endpoint target lengths.
    #[inline]
    pub(super) fn mean_target(&self, v0: VertexId<I>, v1: VertexId<I>) -> f64 {
        0.5 * (self.target_length(v0) + self.target_length(v1))
    }

    pub(super) fn is_too_long(&self, v0: VertexId<I>, v1: VertexId<I>) -> bool {
        let d = (self.mesh.position(v0) - self.mesh.position(v1)).norm();
        d > self.options.split_ratio * self.mean_target(v0, v1)
    }

    pub(super) fn is_too_short(&self, v0: VertexId<I>, v1: VertexId<I>) -> bool {
        let d = (self.mesh.position(v0) - self.mesh.position(v1)).norm();
        d < self.options.collapse_ratio * self.mean_target(v0, v1)
    }

    #[inline]
    pub(super) fn is_locked(&self, v: VertexId<I>) -> bool {
        self.mesh.attr(self.vlocked, v)
    }

    #[inline]
    pub(super) fn is_edge_locked(&self, e: EdgeId<I>) -> bool {
        self.mesh.attr(self.elocked, e)
    }

    #[inline]
    pub(super) fn is_feature(&self, v: VertexId<I>) -> bool {
        self.mesh.attr(self.vfeature, v)
    }

    #[inline]
    pub(super) fn is_feature_edge(&self, e: EdgeId<I>) -> bool {
        self.mesh.attr(self.efeature, e)
    }

    /// Recompute the normal column from the current geometry.
    pub(super) fn update_normals(&mut self) {
        let normals: Vec<_> = self
            .mesh
            .vertex_ids()
            .map(|v| (v, self.mesh.vertex_normal(v)))
            .collect();
        for (v, n) in normals {
            self.mesh.set_attr(self.normal, v, n);
        }
    }

    /// Move `v` onto the reference surface, taking over its interpolated
    /// normal and sizing. No-op without projection.
    pub(super) fn project_to_reference(&mut self, v: VertexId<I>) {
        let Some(reference) = &self.reference else {
            return;
        };
        let Some(projection) = reference.project(self.mesh.position(v)) else {
            return;
        };

        self.mesh.set_position(v, projection.point);
        self.mesh.set_attr(self.normal, v, projection.normal);
        self.mesh.set_attr(self.sizing, v, projection.sizing);
    }

    fn check_valid(&self, step: &str) {
        if cfg!(debug_assertions) && !self.mesh.is_valid() {
            warn!("mesh invalid after {}", step);
        }
        trace!(
            "after {}: {} vertices, {} edges, {} faces",
            step,
            self.mesh.num_vertices(),
            self.mesh.num_edges(),
            self.mesh.num_faces()
        );
    }
}

impl<I: MeshIndex> Drop for Remesher<'_, I> {
    fn drop(&mut self) {
        self.reference = None;
        self.mesh.remove_attribute(self.normal);
        self.mesh.remove_attribute(self.sizing);
        self.mesh.remove_attribute(self.vlocked);
        self.mesh.remove_attribute(self.vfeature);
        self.mesh.remove_attribute(self.elocked);
        if self.owns_efeature {
            self.mesh.remove_attribute(self.efeature);
        }
    }
}

fn report(progress: Option<&Progress>, current: usize, total: usize, message: &str) {
    if let Some(p) = progress {
        p.report(current, total, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{grid, icosphere};
    use crate::mesh::ElementType;

    #[test]
    fn test_transient_attributes_released() {
        let mut mesh = grid(3, 1.0);
        {
            let remesher = Remesher::new(&mut mesh, &RemeshOptions::uniform(0.5)).unwrap();
            assert!(remesher.reference.is_some());
        }
        assert_eq!(mesh.num_attributes(ElementType::Vertex), 0);
        assert_eq!(mesh.num_attributes(ElementType::Edge), 0);
    }

    #[test]
    fn test_caller_feature_column_survives() {
        let mut mesh = grid(3, 1.0);
        let features = mesh.add_attribute(false);
        let options = RemeshOptions::uniform(0.5)
            .with_iterations(1)
            .with_feature_edges(features);

        let remesher = Remesher::new(&mut mesh, &options).unwrap();
        remesher.run(None);

        assert!(mesh.has_attribute(features));
        assert_eq!(mesh.num_attributes(ElementType::Edge), 1);
        // Boundary edges were detected as features.
        let boundary_features = mesh
            .edge_ids()
            .filter(|&e| mesh.is_edge_on_boundary(e))
            .all(|e| mesh.attr(features, e));
        assert!(boundary_features);
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut mesh = grid(2, 1.0);
        let selection = mesh.add_attribute::<crate::mesh::VertexKind, bool>(true);
        mesh.remove_attribute(selection);

        let options = RemeshOptions::uniform(0.5).with_selection(selection);
        let err = Remesher::new(&mut mesh, &options).err().unwrap();
        assert!(matches!(err, MeshError::MissingAttribute { what: "selection" }));
        assert_eq!(mesh.num_attributes(ElementType::Vertex), 0);
    }

    #[test]
    fn test_uniform_sizing_field() {
        let mut mesh = icosphere(1);
        let remesher = Remesher::new(&mut mesh, &RemeshOptions::uniform(0.3)).unwrap();
        for v in remesher.mesh.vertex_ids() {
            assert_eq!(remesher.target_length(v), 0.3);
            assert!((remesher.mesh.attr(remesher.normal, v).norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_progress_reports_completion() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |current, total, _| {
            sink.lock().unwrap().push((current, total));
        });

        let mut mesh = grid(2, 1.0);
        let options = RemeshOptions::uniform(0.6).with_iterations(2);
        let remesher = Remesher::new(&mut mesh, &options).unwrap();
        let stats = remesher.run(Some(&progress));

        let seen = seen.lock().unwrap();
        assert_eq!(stats.iterations, 2);
        assert_eq!(seen.last(), Some(&(9, 9)));
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    }
}
