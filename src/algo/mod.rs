//! Remeshing algorithms and the geometry they are built on.
//!
//! - **Closest points**: point-to-segment and point-to-triangle queries
//! - **Projection**: nearest-triangle oracle over a frozen reference surface
//! - **Curvature**: discrete curvature estimation driving adaptive sizing
//! - **Remeshing**: uniform and curvature-adaptive isotropic remeshing

pub mod closest_point;
pub mod curvature;
pub mod progress;
pub mod projection;
pub mod remesh;

pub use progress::Progress;
