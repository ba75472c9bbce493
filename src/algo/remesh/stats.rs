use std::fmt;

/// Summary of a remeshing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemeshStats {
    /// Iterations performed.
    pub iterations: usize,
    /// Edges split.
    pub splits: usize,
    /// Edges collapsed.
    pub collapses: usize,
    /// Edges flipped to improve valence.
    pub flips: usize,
    /// Caps removed during postprocessing.
    pub caps_removed: usize,
    /// Live vertices before the run.
    pub vertices_before: usize,
    /// Live faces before the run.
    pub faces_before: usize,
    /// Live vertices after the run.
    pub vertices_after: usize,
    /// Live faces after the run.
    pub faces_after: usize,
}

impl fmt::Display for RemeshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} iterations: {} splits, {} collapses, {} flips, {} caps removed; \
             {} vertices / {} faces -> {} vertices / {} faces",
            self.iterations,
            self.splits,
            self.collapses,
            self.flips,
            self.caps_removed,
            self.vertices_before,
            self.faces_before,
            self.vertices_after,
            self.faces_after
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let stats = RemeshStats {
            iterations: 2,
            splits: 10,
            collapses: 4,
            flips: 3,
            caps_removed: 1,
            vertices_before: 9,
            faces_before: 8,
            vertices_after: 15,
            faces_after: 20,
        };
        assert_eq!(
            stats.to_string(),
            "2 iterations: 10 splits, 4 collapses, 3 flips, 1 caps removed; \
             9 vertices / 8 faces -> 15 vertices / 20 faces"
        );
    }
}
