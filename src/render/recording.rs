//! In-memory [`RenderDevice`] that records calls instead of drawing
//!
//! Backs the headless demo and the tests. Texture creation can be made to
//! fail on demand to exercise the fallback path.

use std::collections::HashMap;

use super::device::{DrawState, EffectHandle, MeshHandle, PrimitiveType, RenderDevice, TextureHandle};
use super::mesh::GridVertex;
use super::uniforms::{FrameUniforms, NodeUniforms};
use crate::core::types::Result;
use crate::core::Error;
use crate::terrain::HeightMap;

/// One recorded draw call with the node constants that were bound for it.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub primitive: PrimitiveType,
    pub start: u32,
    pub count: u32,
    pub state: DrawState,
    pub uniforms: Option<NodeUniforms>,
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    next_handle: u32,
    meshes: HashMap<MeshHandle, usize>,
    textures: HashMap<TextureHandle, (f32, f32)>,
    draws: Vec<DrawCall>,
    frame_uniforms: Option<FrameUniforms>,
    node_uniforms: Option<NodeUniforms>,
    fail_textures: usize,
    texture_limit: Option<usize>,
    textures_created: usize,
    textures_released: usize,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` texture creations.
    pub fn fail_next_textures(&mut self, count: usize) {
        self.fail_textures = count;
    }

    /// Fail texture creation whenever `limit` textures are already live.
    pub fn set_texture_limit(&mut self, limit: Option<usize>) {
        self.texture_limit = limit;
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Forget recorded draws (call at the start of each frame).
    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn is_live(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(&texture)
    }

    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    pub fn textures_released(&self) -> usize {
        self.textures_released
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn frame_uniforms(&self) -> Option<&FrameUniforms> {
        self.frame_uniforms.as_ref()
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl RenderDevice for RecordingDevice {
    fn create_mesh(&mut self, vertices: &[GridVertex], indices: &[u16]) -> Result<MeshHandle> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(Error::Device("cannot create an empty mesh".into()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(Error::Device(format!("index {} out of range for {} vertices", bad, vertices.len())));
        }
        let handle = MeshHandle(self.next());
        self.meshes.insert(handle, indices.len());
        Ok(handle)
    }

    fn create_height_texture(&mut self, map: &HeightMap) -> Result<TextureHandle> {
        if self.fail_textures > 0 {
            self.fail_textures -= 1;
            return Err(Error::Device("texture allocation failed".into()));
        }
        if let Some(limit) = self.texture_limit {
            if self.textures.len() >= limit {
                return Err(Error::Device(format!("texture limit of {} reached", limit)));
            }
        }
        let handle = TextureHandle(self.next());
        self.textures.insert(handle, (map.min(), map.max()));
        self.textures_created += 1;
        Ok(handle)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_some() {
            self.textures_released += 1;
        } else {
            log::warn!("release of unknown texture {:?}", texture);
        }
    }

    fn set_frame_uniforms(&mut self, _effect: EffectHandle, uniforms: &FrameUniforms) {
        self.frame_uniforms = Some(*uniforms);
    }

    fn set_node_uniforms(&mut self, _effect: EffectHandle, uniforms: &NodeUniforms) {
        self.node_uniforms = Some(*uniforms);
    }

    fn draw(&mut self, primitive: PrimitiveType, start: u32, count: u32, state: &DrawState) -> Result<()> {
        let available = self
            .meshes
            .get(&state.mesh)
            .copied()
            .ok_or_else(|| Error::Device(format!("draw with unknown mesh {:?}", state.mesh)))?;
        let end = start
            .checked_add(count)
            .ok_or_else(|| Error::Device(format!("draw range {}+{} overflows", start, count)))?;
        if end as usize > available {
            return Err(Error::Device(format!(
                "draw range {}..{} exceeds {} indices",
                start, end, available
            )));
        }
        self.draws.push(DrawCall {
            primitive,
            start,
            count,
            state: *state,
            uniforms: self.node_uniforms,
        });
        Ok(())
    }
}
