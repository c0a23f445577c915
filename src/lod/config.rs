//! Runtime configuration for quadtree refinement

use serde::{Deserialize, Serialize};

use super::horizon::HorizonConfig;
use super::metric::ErrorMetric;
use crate::core::types::Result;
use crate::core::Error;

/// Deepest level any configuration may request. Keeps node widths well
/// inside f64 precision and the worst-case tree size finite.
pub const MAX_SUPPORTED_LEVEL: u32 = 24;

/// Distances and widths are clamped to at least this before dividing.
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// What to do with the children of a split node that no longer needs them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Collapse the stale subtree, releasing its height textures.
    #[default]
    Merge,
    /// Stop recursing but keep the subtree allocated for a quick re-split.
    Retain,
}

/// Validated settings consumed by [`LodSelector`](super::LodSelector).
#[derive(Clone, Debug, PartialEq)]
pub struct LodConfig {
    /// Deepest level (root = 0). Nodes at this level are always accepted.
    pub max_level: u32,
    /// Vertices per edge of the shared grid mesh.
    pub grid_size: u32,
    /// Split criterion.
    pub error_metric: ErrorMetric,
    /// Horizon culling settings (planets only).
    pub horizon: HorizonConfig,
    /// Stale-children handling.
    pub merge_policy: MergePolicy,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            max_level: 8,
            grid_size: 17,
            error_metric: ErrorMetric::default(),
            horizon: HorizonConfig::default(),
            merge_policy: MergePolicy::default(),
        }
    }
}

impl LodConfig {
    /// Reject settings that would break the per-frame recursion.
    pub fn validate(&self) -> Result<()> {
        if self.max_level == 0 || self.max_level > MAX_SUPPORTED_LEVEL {
            return Err(Error::Config(format!(
                "max_level must be in 1..={}, got {}",
                MAX_SUPPORTED_LEVEL, self.max_level
            )));
        }
        validate_grid_size(self.grid_size)?;
        self.error_metric.validate()?;
        self.horizon.validate()?;
        Ok(())
    }
}

/// Grid must be odd (the strip zig-zags over an even number of rows), at
/// least 3, and small enough for 16-bit indices.
pub fn validate_grid_size(grid_size: u32) -> Result<()> {
    if grid_size < 3 || grid_size % 2 == 0 {
        return Err(Error::Config(format!(
            "grid_size must be odd and >= 3, got {}",
            grid_size
        )));
    }
    if (grid_size as u64 * grid_size as u64) > u16::MAX as u64 + 1 {
        return Err(Error::Config(format!(
            "grid_size {} needs more than 16-bit vertex indices",
            grid_size
        )));
    }
    Ok(())
}

/// Number of times `root_width` can be halved before the grid's vertex
/// spacing drops below `min_vertex_spacing`.
///
/// ```text
/// max_level = floor(log2(root_width / ((grid_size - 1) * min_vertex_spacing)))
/// ```
///
/// Clamped to `1..=MAX_SUPPORTED_LEVEL`.
///
/// # Examples
/// ```
/// use quadsphere::lod::compute_max_level;
///
/// // 16 cells of 1 unit fit a 16-unit root: one level only
/// assert_eq!(compute_max_level(16.0, 17, 1.0), 1);
/// // 4096 / 16 = 256 = 2^8
/// assert_eq!(compute_max_level(4096.0, 17, 1.0), 8);
/// ```
pub fn compute_max_level(root_width: f64, grid_size: u32, min_vertex_spacing: f64) -> u32 {
    let cells = grid_size.saturating_sub(1).max(1) as f64;
    let spacing = min_vertex_spacing.max(DEGENERATE_EPSILON);
    let halvings = (root_width / (cells * spacing)).log2().floor();

    if !halvings.is_finite() || halvings < 1.0 {
        return 1;
    }
    (halvings as u32).min(MAX_SUPPORTED_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LodConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.merge_policy, MergePolicy::Merge);
    }

    #[test]
    fn test_rejects_zero_max_level() {
        let config = LodConfig { max_level: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_excessive_max_level() {
        let config = LodConfig { max_level: MAX_SUPPORTED_LEVEL + 1, ..Default::default() };
        assert!(config.validate().is_err());

        let config = LodConfig { max_level: MAX_SUPPORTED_LEVEL, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grid_size_validation() {
        for bad in [0, 1, 2, 4, 16, 257] {
            assert!(validate_grid_size(bad).is_err(), "grid {} should be rejected", bad);
        }
        for good in [3, 9, 17, 33, 65, 255] {
            assert!(validate_grid_size(good).is_ok(), "grid {} should be accepted", good);
        }
    }

    #[test]
    fn test_compute_max_level() {
        assert_eq!(compute_max_level(4096.0, 17, 1.0), 8);
        assert_eq!(compute_max_level(4095.0, 17, 1.0), 7);
        assert_eq!(compute_max_level(8192.0, 33, 1.0), 8);
        assert_eq!(compute_max_level(4096.0, 17, 2.0), 7);
    }

    #[test]
    fn test_compute_max_level_earth_scale() {
        // Four roots per cube face, each one radius wide
        let level = compute_max_level(6_371_000.0, 17, 1.0);
        assert_eq!(level, 18);
    }

    #[test]
    fn test_compute_max_level_clamps() {
        // Tiny root still gets one level
        assert_eq!(compute_max_level(1.0, 17, 1.0), 1);
        assert_eq!(compute_max_level(0.0, 17, 1.0), 1);
        assert_eq!(compute_max_level(-5.0, 17, 1.0), 1);
        // Huge root is capped
        assert_eq!(compute_max_level(1.0e30, 17, 1.0), MAX_SUPPORTED_LEVEL);
        // Degenerate spacing does not divide by zero
        assert_eq!(compute_max_level(4096.0, 17, 0.0), MAX_SUPPORTED_LEVEL);
    }
}
