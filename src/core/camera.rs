//! Camera state consumed by LOD selection and drawing
//!
//! Positions are double precision: planet radii in metres run to millions
//! of units and single precision loses the last few metres of detail.

use crate::core::types::{DMat4, DQuat, DVec3};

/// Camera with position, rotation, and projection parameters
#[derive(Clone, Debug)]
pub struct Camera {
    /// World position (planet centre is the origin)
    pub position: DVec3,
    /// Rotation as quaternion
    pub rotation: DQuat,
    /// Vertical field of view in radians
    pub fov_y: f64,
    /// Aspect ratio (width / height)
    pub aspect: f64,
    /// Near clip plane
    pub near: f64,
    /// Far clip plane
    pub far: f64,
    /// Horizontal display resolution in pixels
    pub resolution_x: u32,
}

impl Camera {
    /// Create a new camera looking down -Z
    pub fn new(position: DVec3, fov_y_degrees: f64, aspect: f64) -> Self {
        Self {
            position,
            rotation: DQuat::IDENTITY,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near: 1.0,
            far: 1.0e8,
            resolution_x: 1280,
        }
    }

    /// Create camera looking at a target
    pub fn look_at(position: DVec3, target: DVec3, up: DVec3) -> Self {
        let mut camera = Self::new(position, 60.0, 16.0 / 9.0);
        camera.point_at(target, up);
        camera
    }

    /// Re-orient the camera towards `target`, keeping its position.
    ///
    /// Falls back to an alternative up vector when `up` is parallel to the
    /// view direction, and leaves the rotation untouched when `target`
    /// coincides with the camera.
    pub fn point_at(&mut self, target: DVec3, up: DVec3) {
        let Some(forward) = (target - self.position).try_normalize() else {
            return;
        };
        let right = forward
            .cross(up)
            .try_normalize()
            .or_else(|| forward.cross(DVec3::Z).try_normalize())
            .unwrap_or(DVec3::X);
        let up = right.cross(forward);

        self.rotation = DQuat::from_mat3(&glam::DMat3::from_cols(right, up, -forward));
    }

    /// Get view matrix (world to camera space)
    pub fn view_matrix(&self) -> DMat4 {
        let rotation_matrix = DMat4::from_quat(self.rotation.conjugate());
        let translation_matrix = DMat4::from_translation(-self.position);
        rotation_matrix * translation_matrix
    }

    /// Get projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get forward direction (negative Z in camera space)
    pub fn forward(&self) -> DVec3 {
        self.rotation * -DVec3::Z
    }

    /// Get right direction (positive X in camera space)
    pub fn right(&self) -> DVec3 {
        self.rotation * DVec3::X
    }

    /// Get up direction (positive Y in camera space)
    pub fn up(&self) -> DVec3 {
        self.rotation * DVec3::Y
    }

    /// Horizontal field of view in radians, derived from `fov_y` and aspect.
    pub fn fov_x(&self) -> f64 {
        2.0 * ((self.fov_y * 0.5).tan() * self.aspect).atan()
    }

    /// `2 * tan(fov_x / 2)`, the denominator term of the screen-space error.
    pub fn two_tan_half_fov(&self) -> f64 {
        2.0 * (self.fov_y * 0.5).tan() * self.aspect
    }

    /// Distance from the world origin (the planet centre).
    pub fn height(&self) -> f64 {
        self.position.length()
    }

    /// Update aspect ratio and horizontal resolution (call on window resize)
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.resolution_x = width.max(1);
        self.aspect = width.max(1) as f64 / height.max(1) as f64;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(DVec3::new(0.0, 0.0, 5.0), 60.0, 16.0 / 9.0)
    }
}
