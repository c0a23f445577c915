//! Drawing: shared grid mesh, shader constants, height textures, and the
//! device seam the host implements

pub mod device;
pub mod mesh;
pub mod uniforms;
pub mod textures;
pub mod renderer;
pub mod recording;

pub use device::{DrawState, EffectHandle, MeshHandle, PrimitiveType, RenderDevice, TextureHandle, MAX_TEXTURE_UNITS};
pub use mesh::{GridMesh, GridVertex};
pub use recording::{DrawCall, RecordingDevice};
pub use renderer::{DrawStats, SurfaceRenderer};
pub use textures::{HeightTextureCache, ProvisionStats};
pub use uniforms::{FrameUniforms, NodeUniforms};
