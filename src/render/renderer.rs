//! Issues one draw per visible node

use super::device::{DrawState, EffectHandle, MeshHandle, PrimitiveType, RenderDevice};
use super::mesh::GridMesh;
use super::textures::HeightTextureCache;
use super::uniforms::{FrameUniforms, NodeUniforms};
use crate::core::types::{DVec3, Result};
use crate::core::Camera;
use crate::lod::{Face, FaceShape, PatchKey};

/// Counters from one draw pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draw_calls: usize,
    /// Draws bound to the fallback texture
    pub fallback_draws: usize,
    /// Visible ids that no longer name a node
    pub skipped: usize,
}

/// Draws the shared grid mesh once per visible node.
#[derive(Clone, Debug)]
pub struct SurfaceRenderer {
    effect: EffectHandle,
    mesh: MeshHandle,
    primitive: PrimitiveType,
    index_count: u32,
    wireframe: bool,
}

impl SurfaceRenderer {
    /// Upload `mesh` as a triangle strip.
    pub fn new(device: &mut dyn RenderDevice, effect: EffectHandle, mesh: &GridMesh) -> Result<Self> {
        let handle = device.create_mesh(mesh.vertices(), mesh.strip_indices())?;
        Ok(Self {
            effect,
            mesh: handle,
            primitive: PrimitiveType::TriangleStrip,
            index_count: mesh.strip_indices().len() as u32,
            wireframe: false,
        })
    }

    /// Upload `mesh` as an indexed triangle list.
    pub fn with_triangle_list(device: &mut dyn RenderDevice, effect: EffectHandle, mesh: &GridMesh) -> Result<Self> {
        let handle = device.create_mesh(mesh.vertices(), mesh.list_indices())?;
        Ok(Self {
            effect,
            mesh: handle,
            primitive: PrimitiveType::Triangles,
            index_count: mesh.list_indices().len() as u32,
            wireframe: false,
        })
    }

    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    /// Draw every face's visible list with the camera's view-projection,
    /// lit from `sun_direction`.
    pub fn draw(
        &self,
        device: &mut dyn RenderDevice,
        faces: &[Face],
        textures: &HeightTextureCache,
        camera: &Camera,
        sun_direction: DVec3,
    ) -> Result<DrawStats> {
        let radius = faces
            .iter()
            .find_map(|face| match face.shape() {
                FaceShape::Cube { radius, .. } => Some(radius),
                FaceShape::Flat => None,
            })
            .unwrap_or(0.0);
        device.set_frame_uniforms(self.effect, &FrameUniforms::new(camera, radius, sun_direction));

        let view_projection = camera.view_projection();
        let mut state = DrawState::new(self.effect, self.mesh);
        state.wireframe = self.wireframe;
        let mut stats = DrawStats::default();

        for (index, face) in faces.iter().enumerate() {
            for &id in face.visible() {
                let (Some(node), Some(world)) = (face.node(id), face.world_matrix(id)) else {
                    stats.skipped += 1;
                    continue;
                };
                let key = PatchKey::new(index, id);
                let centre = face.orientation().transform_point3(node.centre);
                device.set_node_uniforms(
                    self.effect,
                    &NodeUniforms::new(&view_projection, &world, centre, node.width, node.level),
                );

                state.textures[0] = textures.texture_for(key);
                if !textures.has_texture(key) {
                    stats.fallback_draws += 1;
                }
                device.draw(self.primitive, 0, self.index_count, &state)?;
                stats.draw_calls += 1;
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lod::{LodConfig, LodSelector};
    use crate::render::RecordingDevice;

    fn setup(device: &mut RecordingDevice) -> (SurfaceRenderer, HeightTextureCache) {
        let mesh = GridMesh::new(17).unwrap();
        let renderer = SurfaceRenderer::new(device, EffectHandle(1), &mesh).unwrap();
        let mut textures = HeightTextureCache::new();
        textures.init_fallback(device, 17).unwrap();
        (renderer, textures)
    }

    #[test]
    fn test_one_draw_per_visible_node() {
        let mut device = RecordingDevice::new();
        let (renderer, textures) = setup(&mut device);

        let mut faces = vec![Face::flat(4096.0)];
        let camera = Camera::look_at(DVec3::new(0.0, 10.0, 0.0), DVec3::new(100.0, 0.0, 0.0), DVec3::Y);
        LodSelector::new(LodConfig::default()).unwrap().select(&mut faces, &camera);

        let stats = renderer.draw(&mut device, &faces, &textures, &camera, DVec3::X).unwrap();
        assert_eq!(stats.draw_calls, faces[0].visible().len());
        assert_eq!(device.draws().len(), stats.draw_calls);
        // Nothing provisioned, so every draw uses the fallback
        assert_eq!(stats.fallback_draws, stats.draw_calls);

        for call in device.draws() {
            assert_eq!(call.primitive, PrimitiveType::TriangleStrip);
            assert_eq!(call.count, 2 * 17 * 16);
            assert_eq!(call.state.textures[0], textures.fallback());
            assert!(call.uniforms.is_some());
        }
    }

    #[test]
    fn test_node_uniforms_place_root() {
        let mut device = RecordingDevice::new();
        let (renderer, textures) = setup(&mut device);

        let mut faces = vec![Face::flat(64.0)];
        let camera = Camera::look_at(DVec3::new(0.0, 1.0e6, 0.0), DVec3::ZERO, DVec3::Z);
        LodSelector::new(LodConfig::default()).unwrap().select(&mut faces, &camera);

        renderer.draw(&mut device, &faces, &textures, &camera, DVec3::new(1.0, 1.0, 0.0)).unwrap();
        assert_eq!(device.draws().len(), 1);
        let uniforms = device.draws()[0].uniforms.unwrap();
        assert_eq!(uniforms.width, 64.0);
        assert_eq!(uniforms.level, 0);
        // x axis of the world matrix carries the width scale
        assert_eq!(uniforms.world[0][0], 64.0);
        let frame = device.frame_uniforms().unwrap();
        assert_eq!(frame.radius, 0.0);
        let sun = std::f32::consts::FRAC_1_SQRT_2;
        assert!((frame.sun_direction[0] - sun).abs() < 1e-6);
        assert!((frame.sun_direction[1] - sun).abs() < 1e-6);
    }

    #[test]
    fn test_triangle_list_variant() {
        let mut device = RecordingDevice::new();
        let mesh = GridMesh::new(5).unwrap();
        let renderer = SurfaceRenderer::with_triangle_list(&mut device, EffectHandle(1), &mesh).unwrap();
        assert_eq!(renderer.primitive(), PrimitiveType::Triangles);
        assert_eq!(renderer.index_count(), 96);
    }

    #[test]
    fn test_empty_visible_lists_draw_nothing() {
        let mut device = RecordingDevice::new();
        let (renderer, textures) = setup(&mut device);
        let faces = Face::cube_faces(1000.0);
        let stats = renderer.draw(&mut device, &faces, &textures, &Camera::default(), DVec3::X).unwrap();
        assert_eq!(stats, DrawStats::default());
        assert_eq!(device.frame_uniforms().unwrap().radius, 1000.0);
    }
}
