//! Remeshing configuration.

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeAttribute, VertexAttribute};

/// Edges longer than `split_ratio` times the local target length are split.
pub const DEFAULT_SPLIT_RATIO: f64 = 4.0 / 3.0;

/// Edges shorter than `collapse_ratio` times the local target length are collapsed.
pub const DEFAULT_COLLAPSE_RATIO: f64 = 4.0 / 5.0;

/// Dihedral angle (degrees) from which an edge counts as sharp.
pub const DEFAULT_FEATURE_ANGLE: f64 = 30.0;

/// Opposite angle (degrees) from which a triangle pair counts as a cap.
pub const DEFAULT_CAP_ANGLE: f64 = 170.0;

/// Tangential smoothing sub-iterations per remeshing iteration.
pub const DEFAULT_SMOOTHING_ITERATIONS: usize = 5;

/// Upper bound on the passes of each split / collapse / flip sweep.
pub const DEFAULT_MAX_PASSES: usize = 10;

/// Default number of remeshing iterations.
pub const DEFAULT_ITERATIONS: usize = 10;

/// How the target edge length is chosen per vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingMode {
    /// The same target length everywhere.
    Uniform {
        /// Target edge length.
        target_length: f64,
    },
    /// Target length derived from curvature and a chordal error bound.
    Adaptive {
        /// Lower clamp of the target length.
        min_edge_length: f64,
        /// Upper clamp of the target length.
        max_edge_length: f64,
        /// Allowed distance between the surface and a chord.
        approximation_error: f64,
    },
}

/// Options for [`remesh`](super::remesh).
///
/// # Example
///
/// ```
/// use resurface::algo::remesh::RemeshOptions;
///
/// let options = RemeshOptions::adaptive(0.01, 0.2, 0.001)
///     .with_iterations(5)
///     .with_projection(false);
/// assert!(options.validate().is_ok());
///
/// let bad = RemeshOptions::adaptive(0.3, 0.2, 0.001);
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RemeshOptions {
    /// Sizing field.
    pub sizing: SizingMode,

    /// Number of split / collapse / flip / smooth iterations.
    pub iterations: usize,

    /// Keep vertices on a frozen copy of the input surface.
    pub use_projection: bool,

    /// Tangential smoothing sub-iterations per iteration.
    pub smoothing_iterations: usize,

    /// Split threshold relative to the target length.
    pub split_ratio: f64,

    /// Collapse threshold relative to the target length.
    pub collapse_ratio: f64,

    /// Feature detection angle in degrees.
    pub feature_angle: f64,

    /// Cap detection angle in degrees.
    pub cap_angle: f64,

    /// Ceiling on the passes of each sweep.
    pub max_passes: usize,

    /// Mark boundary edges and sharp edges as features.
    pub detect_features: bool,

    /// Vertices allowed to change. When any is selected, all others are locked.
    pub selection: Option<VertexAttribute<bool>>,

    /// Caller-owned feature edge column, read as pre-marked features and kept
    /// up to date through the run.
    pub feature_edges: Option<EdgeAttribute<bool>>,
}

impl RemeshOptions {
    fn with_sizing(sizing: SizingMode) -> Self {
        Self {
            sizing,
            iterations: DEFAULT_ITERATIONS,
            use_projection: true,
            smoothing_iterations: DEFAULT_SMOOTHING_ITERATIONS,
            split_ratio: DEFAULT_SPLIT_RATIO,
            collapse_ratio: DEFAULT_COLLAPSE_RATIO,
            feature_angle: DEFAULT_FEATURE_ANGLE,
            cap_angle: DEFAULT_CAP_ANGLE,
            max_passes: DEFAULT_MAX_PASSES,
            detect_features: true,
            selection: None,
            feature_edges: None,
        }
    }

    /// Uniform remeshing towards `target_length`.
    pub fn uniform(target_length: f64) -> Self {
        Self::with_sizing(SizingMode::Uniform { target_length })
    }

    /// Curvature-adaptive remeshing.
    pub fn adaptive(min_edge_length: f64, max_edge_length: f64, approximation_error: f64) -> Self {
        Self::with_sizing(SizingMode::Adaptive {
            min_edge_length,
            max_edge_length,
            approximation_error,
        })
    }

    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set whether vertices are projected back onto the input surface.
    pub fn with_projection(mut self, use_projection: bool) -> Self {
        self.use_projection = use_projection;
        self
    }

    /// Set the smoothing sub-iterations per iteration.
    pub fn with_smoothing_iterations(mut self, iterations: usize) -> Self {
        self.smoothing_iterations = iterations;
        self
    }

    /// Set the split threshold ratio.
    pub fn with_split_ratio(mut self, ratio: f64) -> Self {
        self.split_ratio = ratio;
        self
    }

    /// Set the collapse threshold ratio.
    pub fn with_collapse_ratio(mut self, ratio: f64) -> Self {
        self.collapse_ratio = ratio;
        self
    }

    /// Set the feature angle in degrees.
    pub fn with_feature_angle(mut self, degrees: f64) -> Self {
        self.feature_angle = degrees;
        self
    }

    /// Set the cap angle in degrees.
    pub fn with_cap_angle(mut self, degrees: f64) -> Self {
        self.cap_angle = degrees;
        self
    }

    /// Set the pass ceiling of each sweep.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }

    /// Enable or disable automatic feature detection.
    pub fn with_feature_detection(mut self, detect: bool) -> Self {
        self.detect_features = detect;
        self
    }

    /// Restrict remeshing to the selected vertices.
    pub fn with_selection(mut self, selection: VertexAttribute<bool>) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Use a caller-owned feature edge column.
    pub fn with_feature_edges(mut self, features: EdgeAttribute<bool>) -> Self {
        self.feature_edges = Some(features);
        self
    }

    /// Smallest target length the sizing field can produce.
    pub fn min_edge_length(&self) -> f64 {
        match self.sizing {
            SizingMode::Uniform { target_length } => target_length,
            SizingMode::Adaptive {
                min_edge_length, ..
            } => min_edge_length,
        }
    }

    /// Largest target length the sizing field can produce.
    pub fn max_edge_length(&self) -> f64 {
        match self.sizing {
            SizingMode::Uniform { target_length } => target_length,
            SizingMode::Adaptive {
                max_edge_length, ..
            } => max_edge_length,
        }
    }

    /// Check every parameter. Attribute handles are checked against the mesh
    /// when a run starts.
    pub fn validate(&self) -> Result<()> {
        match self.sizing {
            SizingMode::Uniform { target_length } => {
                positive("target_length", target_length)?;
            }
            SizingMode::Adaptive {
                min_edge_length,
                max_edge_length,
                approximation_error,
            } => {
                positive("min_edge_length", min_edge_length)?;
                positive("max_edge_length", max_edge_length)?;
                positive("approximation_error", approximation_error)?;
                if min_edge_length > max_edge_length {
                    return Err(MeshError::invalid_param(
                        "min_edge_length",
                        min_edge_length,
                        "must not exceed max_edge_length",
                    ));
                }
            }
        }

        positive("collapse_ratio", self.collapse_ratio)?;
        if !(self.split_ratio.is_finite() && self.split_ratio > self.collapse_ratio) {
            return Err(MeshError::invalid_param(
                "split_ratio",
                self.split_ratio,
                "must exceed collapse_ratio",
            ));
        }

        if !(0.0..=180.0).contains(&self.feature_angle) {
            return Err(MeshError::invalid_param(
                "feature_angle",
                self.feature_angle,
                "must lie in [0, 180] degrees",
            ));
        }

        if !(self.cap_angle > 90.0 && self.cap_angle <= 180.0) {
            return Err(MeshError::invalid_param(
                "cap_angle",
                self.cap_angle,
                "must lie in (90, 180] degrees",
            ));
        }

        if self.max_passes == 0 {
            return Err(MeshError::invalid_param("max_passes", 0, "must be at least 1"));
        }

        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MeshError::invalid_param(name, value, "must be positive and finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RemeshOptions::uniform(0.1);
        assert_eq!(options.iterations, DEFAULT_ITERATIONS);
        assert_eq!(options.smoothing_iterations, 5);
        assert_eq!(options.max_passes, 10);
        assert!(options.use_projection);
        assert!(options.detect_features);
        assert_eq!(options.min_edge_length(), 0.1);
        assert_eq!(options.max_edge_length(), 0.1);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let options = RemeshOptions::adaptive(0.01, 0.5, 0.002)
            .with_iterations(3)
            .with_projection(false)
            .with_smoothing_iterations(2)
            .with_feature_angle(45.0)
            .with_cap_angle(160.0)
            .with_max_passes(4)
            .with_feature_detection(false);

        assert_eq!(options.iterations, 3);
        assert!(!options.use_projection);
        assert_eq!(options.smoothing_iterations, 2);
        assert_eq!(options.feature_angle, 45.0);
        assert_eq!(options.cap_angle, 160.0);
        assert_eq!(options.max_passes, 4);
        assert!(!options.detect_features);
        assert_eq!(options.min_edge_length(), 0.01);
        assert_eq!(options.max_edge_length(), 0.5);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        let invalid = [
            RemeshOptions::uniform(0.0),
            RemeshOptions::uniform(f64::NAN),
            RemeshOptions::adaptive(0.5, 0.1, 0.01),
            RemeshOptions::adaptive(0.1, 0.5, -1.0),
            RemeshOptions::uniform(1.0).with_split_ratio(0.5),
            RemeshOptions::uniform(1.0).with_collapse_ratio(0.0),
            RemeshOptions::uniform(1.0).with_feature_angle(200.0),
            RemeshOptions::uniform(1.0).with_cap_angle(45.0),
            RemeshOptions::uniform(1.0).with_max_passes(0),
        ];

        for options in &invalid {
            let err = options.validate().unwrap_err();
            assert!(err.is_configuration(), "{:?}", options);
        }
    }
}
