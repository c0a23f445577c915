//! Height fields sampled when quadtree nodes are created

pub mod height_field;
pub use height_field::{FlatHeightField, HeightField};

pub mod fractal;
pub use fractal::{FractalParams, HybridMultifractal};

pub mod height_map;
pub use height_map::HeightMap;
