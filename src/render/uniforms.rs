//! Shader constants for surface drawing

use bytemuck::{Pod, Zeroable};

use crate::core::types::{DMat4, DVec3};
use crate::core::Camera;

/// Per-node constants, set before each draw
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct NodeUniforms {
    /// Unit grid to clip space (64 bytes, offset 0)
    pub world_view_projection: [[f32; 4]; 4],
    /// Unit grid to world space (64 bytes, offset 64)
    pub world: [[f32; 4]; 4],
    /// Node centre in world space (12 bytes, offset 128)
    pub centre: [f32; 3],
    /// Node width (4 bytes, offset 140)
    pub width: f32,
    /// Quadtree level (4 bytes, offset 144)
    pub level: u32,
    /// Padding to 160 bytes (12 bytes, offset 148)
    pub _pad: [u32; 3],
}

impl NodeUniforms {
    /// Build node constants. Products are formed in double precision and
    /// narrowed once at the end.
    pub fn new(view_projection: &DMat4, world: &DMat4, centre: DVec3, width: f64, level: u32) -> Self {
        let wvp = *view_projection * *world;
        Self {
            world_view_projection: wvp.as_mat4().to_cols_array_2d(),
            world: world.as_mat4().to_cols_array_2d(),
            centre: centre.as_vec3().to_array(),
            width: width as f32,
            level,
            _pad: [0; 3],
        }
    }
}

/// Per-frame constants, set once before the node draws
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// View-projection matrix (64 bytes, offset 0)
    pub view_projection: [[f32; 4]; 4],
    /// Camera position in world space (12 bytes, offset 64)
    pub camera_position: [f32; 3],
    /// Sphere radius, 0 for flat terrain (4 bytes, offset 76)
    pub radius: f32,
    /// Unit direction towards the sun (12 bytes, offset 80)
    pub sun_direction: [f32; 3],
    /// Padding to 96 bytes (4 bytes, offset 92)
    pub _pad: u32,
}

impl FrameUniforms {
    /// `sun_direction` is normalized; a zero vector stays zero (unlit).
    pub fn new(camera: &Camera, radius: f64, sun_direction: DVec3) -> Self {
        Self {
            view_projection: camera.view_projection().as_mat4().to_cols_array_2d(),
            camera_position: camera.position.as_vec3().to_array(),
            radius: radius as f32,
            sun_direction: sun_direction.normalize_or_zero().as_vec3().to_array(),
            _pad: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<NodeUniforms>(), 160);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 96);
    }

    #[test]
    fn test_node_uniforms_compose_matrices() {
        let view_projection = DMat4::from_scale(DVec3::splat(2.0));
        let world = DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0));
        let uniforms = NodeUniforms::new(&view_projection, &world, DVec3::new(1.0, 0.0, 0.0), 8.0, 3);

        // Translation column is scaled by the view-projection
        assert_eq!(uniforms.world_view_projection[3], [2.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniforms.world[3], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniforms.width, 8.0);
        assert_eq!(uniforms.level, 3);
        assert!(!bytemuck::bytes_of(&uniforms).is_empty());
    }

    #[test]
    fn test_frame_uniforms() {
        let camera = Camera::new(DVec3::new(0.0, 10.0, 0.0), 60.0, 1.0);
        let uniforms = FrameUniforms::new(&camera, 1000.0, DVec3::new(0.0, 0.0, -3.0));
        assert_eq!(uniforms.camera_position, [0.0, 10.0, 0.0]);
        assert_eq!(uniforms.radius, 1000.0);
        assert_eq!(uniforms.sun_direction, [0.0, 0.0, -1.0]);

        let unlit = FrameUniforms::new(&camera, 0.0, DVec3::ZERO);
        assert_eq!(unlit.sun_direction, [0.0; 3]);
    }
}
