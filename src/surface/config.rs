//! Surface configuration, persisted as JSON

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::core::Error;
use crate::lod::config::validate_grid_size;
use crate::lod::{compute_max_level, ErrorMetric, HorizonConfig, LodConfig, MergePolicy, MAX_SUPPORTED_LEVEL};
use crate::terrain::FractalParams;

/// What kind of surface to build
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceShape {
    /// Cube-sphere: six faces of four roots, each root `radius` wide
    Planet { radius: f64 },
    /// Single face with a single root `width` wide; no horizon culling
    Flat { width: f64 },
}

impl SurfaceShape {
    /// Width of each root node
    pub fn root_width(&self) -> f64 {
        match *self {
            SurfaceShape::Planet { radius } => radius,
            SurfaceShape::Flat { width } => width,
        }
    }

    pub fn radius(&self) -> Option<f64> {
        match *self {
            SurfaceShape::Planet { radius } => Some(radius),
            SurfaceShape::Flat { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub shape: SurfaceShape,
    /// Vertices per edge of the shared grid (odd, >= 3)
    pub grid_size: u32,
    /// Deepest level; derived from `min_vertex_spacing` when absent
    pub max_level: Option<u32>,
    /// Finest vertex spacing the automatic max level may reach
    pub min_vertex_spacing: f64,
    pub error_metric: ErrorMetric,
    pub horizon: HorizonConfig,
    pub merge_policy: MergePolicy,
    pub height: FractalParams,
    pub wireframe: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            shape: SurfaceShape::Planet { radius: 6_371_000.0 },
            grid_size: 17,
            max_level: None,
            min_vertex_spacing: 1.0,
            error_metric: ErrorMetric::default(),
            horizon: HorizonConfig::default(),
            merge_policy: MergePolicy::default(),
            height: FractalParams::default(),
            wireframe: false,
        }
    }
}

impl SurfaceConfig {
    /// Planet of `radius` with default settings
    pub fn planet(radius: f64) -> Self {
        Self {
            shape: SurfaceShape::Planet { radius },
            ..Default::default()
        }
    }

    /// Flat terrain `width` wide with default settings
    pub fn flat(width: f64) -> Self {
        Self {
            shape: SurfaceShape::Flat { width },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let size = self.shape.root_width();
        if !size.is_finite() || size <= 0.0 {
            return Err(Error::Config(format!("surface size must be positive, got {}", size)));
        }
        if !self.min_vertex_spacing.is_finite() || self.min_vertex_spacing <= 0.0 {
            return Err(Error::Config(format!(
                "min_vertex_spacing must be positive, got {}",
                self.min_vertex_spacing
            )));
        }
        if let Some(level) = self.max_level {
            if level == 0 || level > MAX_SUPPORTED_LEVEL {
                return Err(Error::Config(format!(
                    "max_level must be in 1..={}, got {}",
                    MAX_SUPPORTED_LEVEL, level
                )));
            }
        }
        validate_grid_size(self.grid_size)?;
        self.error_metric.validate()?;
        self.horizon.validate()?;
        Ok(())
    }

    /// Configured max level, or the one derived from the root width.
    pub fn resolved_max_level(&self) -> u32 {
        self.max_level.unwrap_or_else(|| {
            compute_max_level(self.shape.root_width(), self.grid_size, self.min_vertex_spacing)
        })
    }

    /// Validated selector settings
    pub fn lod_config(&self) -> Result<LodConfig> {
        self.validate()?;
        Ok(LodConfig {
            max_level: self.resolved_max_level(),
            grid_size: self.grid_size,
            error_metric: self.error_metric,
            horizon: self.horizon.clone(),
            merge_policy: self.merge_policy,
        })
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}
