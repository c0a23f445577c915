//! Split criteria
//!
//! Both metrics measure a node from the camera's distance to its nearest
//! corner and ask whether it is too coarse to draw as-is.

use serde::{Deserialize, Serialize};

use super::config::DEGENERATE_EPSILON;
use crate::core::types::Result;
use crate::core::{Camera, Error};

/// Decides whether a node must be split.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ErrorMetric {
    /// Split while `distance / width < max_ratio`.
    DistanceRatio { max_ratio: f64 },
    /// Split while the projected size of one grid cell is at least
    /// `pixel_threshold` pixels:
    ///
    /// ```text
    /// rho = (width / (grid_size - 1)) * resolution_x / (distance * 2 * tan(fov_x / 2))
    /// ```
    ScreenSpace { pixel_threshold: f64 },
}

impl Default for ErrorMetric {
    fn default() -> Self {
        ErrorMetric::DistanceRatio { max_ratio: 4.0 }
    }
}

impl ErrorMetric {
    /// Reject non-positive or non-finite budgets.
    pub fn validate(&self) -> Result<()> {
        let (name, value) = match *self {
            ErrorMetric::DistanceRatio { max_ratio } => ("max_ratio", max_ratio),
            ErrorMetric::ScreenSpace { pixel_threshold } => ("pixel_threshold", pixel_threshold),
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::Config(format!("{} must be positive, got {}", name, value)));
        }
        Ok(())
    }

    /// Error of a node `width` wide whose nearest corner is `distance` away.
    ///
    /// Larger means coarser relative to the view. Never increases with
    /// distance and never decreases with width.
    pub fn error(&self, distance: f64, width: f64, grid_size: u32, camera: &Camera) -> f64 {
        let distance = distance.max(DEGENERATE_EPSILON);
        let width = width.max(0.0);
        match *self {
            ErrorMetric::DistanceRatio { .. } => width / distance,
            ErrorMetric::ScreenSpace { .. } => {
                let spacing = width / grid_size.saturating_sub(1).max(1) as f64;
                let denominator = (distance * camera.two_tan_half_fov()).max(DEGENERATE_EPSILON);
                spacing * camera.resolution_x as f64 / denominator
            }
        }
    }

    /// Largest acceptable [`error`](Self::error).
    pub fn budget(&self) -> f64 {
        match *self {
            ErrorMetric::DistanceRatio { max_ratio } => 1.0 / max_ratio,
            ErrorMetric::ScreenSpace { pixel_threshold } => pixel_threshold,
        }
    }

    /// True if the node is too coarse for the current view.
    pub fn needs_split(&self, distance: f64, width: f64, grid_size: u32, camera: &Camera) -> bool {
        match *self {
            ErrorMetric::DistanceRatio { max_ratio } => {
                let distance = distance.max(DEGENERATE_EPSILON);
                let width = width.max(DEGENERATE_EPSILON);
                distance / width < max_ratio
            }
            ErrorMetric::ScreenSpace { .. } => {
                self.error(distance, width, grid_size, camera) >= self.budget()
            }
        }
    }
}
