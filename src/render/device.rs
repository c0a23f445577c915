//! Graphics device seam
//!
//! The surface never talks to a graphics API directly. A host implements
//! [`RenderDevice`] over its backend; tests and the headless demo use
//! [`RecordingDevice`](super::RecordingDevice).

use super::mesh::GridVertex;
use super::uniforms::{FrameUniforms, NodeUniforms};
use crate::core::types::Result;
use crate::terrain::HeightMap;

/// Texture units available to a draw
pub const MAX_TEXTURE_UNITS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveType {
    TriangleStrip,
    Triangles,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Compiled shader program, owned by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectHandle(pub u32);

/// Everything bound for one draw call
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawState {
    pub effect: EffectHandle,
    pub mesh: MeshHandle,
    pub textures: [Option<TextureHandle>; MAX_TEXTURE_UNITS],
    pub wireframe: bool,
}

impl DrawState {
    pub fn new(effect: EffectHandle, mesh: MeshHandle) -> Self {
        Self {
            effect,
            mesh,
            textures: [None; MAX_TEXTURE_UNITS],
            wireframe: false,
        }
    }
}

/// Graphics backend operations used by surface drawing.
///
/// Creation calls may fail; `Device` errors from `create_height_texture`
/// are recoverable (the node draws with a fallback and is retried), errors
/// from `create_mesh` are not.
pub trait RenderDevice {
    fn create_mesh(&mut self, vertices: &[GridVertex], indices: &[u16]) -> Result<MeshHandle>;

    /// Upload a single-channel float texture holding `map`.
    fn create_height_texture(&mut self, map: &HeightMap) -> Result<TextureHandle>;

    fn release_texture(&mut self, texture: TextureHandle);

    fn set_frame_uniforms(&mut self, effect: EffectHandle, uniforms: &FrameUniforms);

    fn set_node_uniforms(&mut self, effect: EffectHandle, uniforms: &NodeUniforms);

    /// Draw `count` indices starting at `start`.
    fn draw(&mut self, primitive: PrimitiveType, start: u32, count: u32, state: &DrawState) -> Result<()>;
}
