//! Pluggable height function contract

use crate::core::types::DVec3;

/// Deterministic elevation function over 3D surface points.
///
/// Implementations must be pure: the same `(point, octaves)` always yields
/// the same height. A node's height map is generated once when the node is
/// created and stays valid until the node is merged away, so hidden
/// frame-dependent state would make neighbouring nodes disagree.
///
/// `octaves` may carry a fractional part; implementations blend in a final
/// partial-weight octave for it.
pub trait HeightField: Send + Sync {
    /// Elevation at `point`.
    fn sample(&self, point: DVec3, octaves: f64) -> f64;

    /// Octave count to use for a node at quadtree `level` (root = 0).
    fn octaves_for_level(&self, level: u32) -> f64;
}

/// Constant-height field. Useful for tests and as a stand-in while a real
/// field is being tuned.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatHeightField {
    pub height: f64,
}

impl FlatHeightField {
    pub fn new(height: f64) -> Self {
        Self { height }
    }
}

impl HeightField for FlatHeightField {
    fn sample(&self, _point: DVec3, _octaves: f64) -> f64 {
        self.height
    }

    fn octaves_for_level(&self, _level: u32) -> f64 {
        0.0
    }
}
