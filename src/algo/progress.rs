//! Progress reporting for long-running algorithms.
//!
//! Algorithms accept an optional [`Progress`] and report coarse steps through
//! it; the callback decides what to do with them.
//!
//! # Example
//!
//! ```
//! use resurface::algo::Progress;
//! use resurface::algo::remesh::{remesh_with_progress, RemeshOptions};
//! use resurface::prelude::*;
//! use nalgebra::Point3;
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current, total, message);
//! });
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! let options = RemeshOptions::uniform(0.5).with_iterations(2);
//! remesh_with_progress(&mut mesh, &options, &progress).unwrap();
//! ```

/// A progress callback that receives updates during long-running operations.
///
/// The callback receives:
/// - `current`: Current step (0-based)
/// - `total`: Total number of steps
/// - `message`: Description of the current operation
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report progress within a sub-range.
    ///
    /// Maps progress from `[0, sub_total]` to `[range_current, range_current + 1]`
    /// within a total of `range_total` steps. This enables hierarchical progress
    /// where sub-operations report their progress within an allocated slice.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Four top-level steps; report half of step 1 done.
    /// progress.report_sub(50, 100, 1, 4, "Collapsing short edges");
    /// ```
    #[inline]
    pub fn report_sub(
        &self,
        sub_current: usize,
        sub_total: usize,
        range_current: usize,
        range_total: usize,
        message: &str,
    ) {
        if sub_total == 0 || range_total == 0 {
            return;
        }
        // Map sub-progress to the range [range_current, range_current + 1)
        // Using fixed-point math to avoid floating point: multiply by 1000 for precision
        let sub_fraction = (sub_current * 1000) / sub_total;
        let effective = range_current * 1000 + sub_fraction;
        let total_scaled = range_total * 1000;
        (self.callback)(effective, total_scaled, message);
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording() -> (Progress, Arc<Mutex<Vec<(usize, usize, String)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |current, total, message| {
            sink.lock().unwrap().push((current, total, message.to_string()));
        });
        (progress, seen)
    }

    #[test]
    fn test_report() {
        let (progress, seen) = recording();
        progress.report(3, 9, "Flipping edges");
        assert_eq!(seen.lock().unwrap()[0], (3, 9, "Flipping edges".to_string()));
    }

    #[test]
    fn test_report_sub_scales_into_range() {
        let (progress, seen) = recording();
        progress.report_sub(1, 4, 2, 5, "Smoothing");
        progress.report_sub(1, 0, 2, 5, "ignored");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!((seen[0].0, seen[0].1), (2250, 5000));
    }

    #[test]
    fn test_none_and_debug() {
        let progress = Progress::default();
        progress.report(1, 1, "done");
        assert!(format!("{:?}", progress).starts_with("Progress"));
    }
}
