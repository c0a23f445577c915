//! Horizon culling for spherical surfaces
//!
//! A point is hidden when the angle between the camera direction and the
//! point direction (both from the planet centre) exceeds the horizon angle
//! plus a margin. The margin is wide at altitude so mountains poking over
//! the geometric horizon stay visible, and narrow near the ground.

use serde::{Deserialize, Serialize};

use super::config::DEGENERATE_EPSILON;
use crate::core::types::{DVec3, Result};
use crate::core::Error;

/// Horizon culling settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    pub enabled: bool,
    pub near_margin_degrees: f64,    // Margin at or below margin_switch_altitude
    pub far_margin_degrees: f64,     // Margin above margin_switch_altitude
    pub margin_switch_altitude: f64, // Altitude above the base radius
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            near_margin_degrees: 5.0,
            far_margin_degrees: 20.0,
            margin_switch_altitude: 1000.0,
        }
    }
}

impl HorizonConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("near_margin_degrees", self.near_margin_degrees),
            ("far_margin_degrees", self.far_margin_degrees),
        ] {
            if !(0.0..=90.0).contains(&value) {
                return Err(Error::Config(format!("horizon {} must be in [0, 90], got {}", name, value)));
            }
        }
        if !self.margin_switch_altitude.is_finite() || self.margin_switch_altitude < 0.0 {
            return Err(Error::Config(format!(
                "horizon margin_switch_altitude must be >= 0, got {}",
                self.margin_switch_altitude
            )));
        }
        Ok(())
    }

    /// Margin in degrees for a camera `altitude` above the base radius.
    pub fn margin_degrees(&self, altitude: f64) -> f64 {
        if altitude > self.margin_switch_altitude {
            self.far_margin_degrees
        } else {
            self.near_margin_degrees
        }
    }
}

/// Per-frame horizon test. `Inactive` never culls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Horizon {
    Inactive,
    Active {
        /// Unit direction from the planet centre to the camera
        camera_dir: DVec3,
        /// Horizon angle plus margin, in radians
        angle: f64,
    },
}

impl Horizon {
    /// Build the horizon for a camera at `camera_position` over a sphere of
    /// `radius` centred on the origin.
    ///
    /// Inactive when culling is disabled or the camera sits at the centre.
    /// A camera inside the sphere sees a zero-angle horizon plus margin.
    pub fn new(config: &HorizonConfig, camera_position: DVec3, radius: f64) -> Self {
        if !config.enabled {
            return Horizon::Inactive;
        }
        let height = camera_position.length();
        if height < DEGENERATE_EPSILON || radius <= 0.0 {
            return Horizon::Inactive;
        }

        let geometric = (radius / height).clamp(-1.0, 1.0).acos();
        let margin = config.margin_degrees(height - radius).to_radians();

        Horizon::Active {
            camera_dir: camera_position / height,
            angle: geometric + margin,
        }
    }

    /// Horizon angle in radians, if active.
    pub fn angle(&self) -> Option<f64> {
        match *self {
            Horizon::Inactive => None,
            Horizon::Active { angle, .. } => Some(angle),
        }
    }

    /// True if `point` lies beyond the horizon.
    pub fn is_hidden(&self, point: DVec3) -> bool {
        let Horizon::Active { camera_dir, angle } = *self else {
            return false;
        };
        let Some(dir) = point.try_normalize() else {
            return false;
        };
        angle_between(camera_dir, dir) > angle
    }

    /// Whether every point of a patch lies beyond the horizon.
    ///
    /// The patch is bounded by the cone around `centre` reaching its farthest
    /// corner; it is hidden only when that whole cone is past the horizon, so a
    /// camera over the interior of a wide patch never culls it.
    pub fn is_patch_hidden(&self, centre: DVec3, corners: &[DVec3; 4]) -> bool {
        let Horizon::Active { camera_dir, angle } = *self else {
            return false;
        };
        let Some(centre_dir) = centre.try_normalize() else {
            return false;
        };
        let mut extent = 0.0_f64;
        for corner in corners {
            let Some(dir) = corner.try_normalize() else {
                return false;
            };
            extent = extent.max(angle_between(centre_dir, dir));
        }
        angle_between(camera_dir, centre_dir) - extent > angle
    }
}

fn angle_between(a: DVec3, b: DVec3) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}
