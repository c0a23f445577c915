//! Shared unit grid mesh
//!
//! One `grid_size x grid_size` vertex grid spanning `[-0.5, 0.5]` in X and Z
//! at Y = 0. Every node draws this mesh through its own transform, so it is
//! uploaded once per surface.

use bytemuck::{Pod, Zeroable};

use crate::core::types::{DVec3, Result};
use crate::lod::config::validate_grid_size;

/// Grid vertex (must match the vertex shader input layout)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GridVertex {
    /// Unit-grid position (12 bytes, offset 0)
    pub position: [f32; 3],
    /// Height-map coordinate in [0, 1] (8 bytes, offset 12)
    pub uv: [f32; 2],
}

#[derive(Clone, Debug)]
pub struct GridMesh {
    grid_size: u32,
    vertices: Vec<GridVertex>,
    strip_indices: Vec<u16>,
    list_indices: Vec<u16>,
}

impl GridMesh {
    /// Build the grid. `grid_size` must be odd, at least 3, and fit 16-bit indices.
    pub fn new(grid_size: u32) -> Result<Self> {
        validate_grid_size(grid_size)?;
        let size = grid_size as usize;
        let step = 1.0 / (size - 1) as f32;

        let mut vertices = Vec::with_capacity(size * size);
        for z in 0..size {
            for x in 0..size {
                let u = x as f32 * step;
                let v = z as f32 * step;
                vertices.push(GridVertex {
                    position: [u - 0.5, 0.0, v - 0.5],
                    uv: [u, v],
                });
            }
        }

        Ok(Self {
            grid_size,
            vertices,
            strip_indices: strip_indices(size),
            list_indices: list_indices(size),
        })
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn vertices(&self) -> &[GridVertex] {
        &self.vertices
    }

    /// Zig-zag triangle strip over row pairs: `2 * size * (size - 1)` indices.
    pub fn strip_indices(&self) -> &[u16] {
        &self.strip_indices
    }

    /// Plain triangle list: `(size - 1)^2 * 6` indices.
    pub fn list_indices(&self) -> &[u16] {
        &self.list_indices
    }

    /// Vertex positions in double precision, for height sampling.
    pub fn unit_points(&self) -> Vec<DVec3> {
        self.vertices
            .iter()
            .map(|v| DVec3::new(v.position[0] as f64, v.position[1] as f64, v.position[2] as f64))
            .collect()
    }
}

/// Even rows run left to right, odd rows right to left, so consecutive rows
/// share their turning vertices and the strip needs no restarts.
fn strip_indices(size: usize) -> Vec<u16> {
    let at = |x: usize, z: usize| (x + z * size) as u16;
    let mut indices = Vec::with_capacity(2 * size * (size - 1));

    let mut z = 0;
    while z < size - 1 {
        for x in 0..size {
            indices.push(at(x, z));
            indices.push(at(x, z + 1));
        }
        z += 1;
        if z < size - 1 {
            for x in (0..size).rev() {
                indices.push(at(x, z + 1));
                indices.push(at(x, z));
            }
        }
        z += 1;
    }
    indices
}

fn list_indices(size: usize) -> Vec<u16> {
    let at = |x: usize, z: usize| (x + z * size) as u16;
    let mut indices = Vec::with_capacity((size - 1) * (size - 1) * 6);
    for z in 0..size - 1 {
        for x in 0..size - 1 {
            indices.extend_from_slice(&[at(x, z), at(x, z + 1), at(x + 1, z)]);
            indices.extend_from_slice(&[at(x + 1, z), at(x, z + 1), at(x + 1, z + 1)]);
        }
    }
    indices
}
