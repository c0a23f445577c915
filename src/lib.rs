//! Quadsphere - quadtree level-of-detail terrain for cube-sphere planets and
//! flat landscapes

pub mod core;
pub mod terrain;
pub mod lod;
pub mod render;
pub mod surface;

pub use crate::core::{Camera, Error};
pub use crate::surface::{Surface, SurfaceConfig, SurfaceShape};
