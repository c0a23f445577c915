//! Per-node height maps: one `f32` sample per shared-grid vertex

use std::path::Path;

use rayon::prelude::*;

use super::height_field::HeightField;
use crate::core::types::{DVec3, Result};
use crate::core::Error;

/// Square grid of height samples, row-major with X fastest.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    size: usize,
    samples: Vec<f32>,
    min: f32,
    max: f32,
}

impl HeightMap {
    /// All-zero height map, used as the fallback while a real one is pending.
    pub fn flat(size: usize) -> Self {
        Self {
            size,
            samples: vec![0.0; size * size],
            min: 0.0,
            max: 0.0,
        }
    }

    /// Wrap existing samples. Returns `None` if the sample count is not `size * size`.
    pub fn from_samples(size: usize, samples: Vec<f32>) -> Option<Self> {
        if samples.len() != size * size {
            return None;
        }
        let (min, max) = bounds(&samples);
        Some(Self { size, samples, min, max })
    }

    /// Sample `field` at each of `points` (one per grid vertex).
    ///
    /// Sampling fans out across the rayon pool; the call still returns only
    /// once every sample is in place.
    pub fn generate(field: &dyn HeightField, points: &[DVec3], size: usize, octaves: f64) -> Option<Self> {
        if points.len() != size * size {
            return None;
        }
        let samples: Vec<f32> = points
            .par_iter()
            .map(|p| field.sample(*p, octaves) as f32)
            .collect();
        Self::from_samples(size, samples)
    }

    /// Samples per edge
    pub fn size(&self) -> usize {
        self.size
    }

    /// Raw samples (row-major, X fastest)
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Lowest sample
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Highest sample
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Height at grid coordinate `(x, z)`, or `None` outside the grid.
    pub fn get(&self, x: usize, z: usize) -> Option<f32> {
        if x >= self.size || z >= self.size {
            return None;
        }
        Some(self.samples[x + z * self.size])
    }

    /// Write the map as an 8-bit grayscale PNG, normalised to its own range.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let range = self.max - self.min;
        let pixels: Vec<u8> = self
            .samples
            .iter()
            .map(|h| {
                if range > 0.0 {
                    (((h - self.min) / range) * 255.0).round() as u8
                } else {
                    0
                }
            })
            .collect();

        let side = self.size as u32;
        let image = image::GrayImage::from_raw(side, side, pixels)
            .ok_or_else(|| Error::Config(format!("height map of size {} has a mismatched buffer", self.size)))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        image.save(path)?;
        Ok(())
    }
}

fn bounds(samples: &[f32]) -> (f32, f32) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let min = samples.iter().copied().fold(f32::INFINITY, f32::min);
    let max = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{FlatHeightField, FractalParams, HybridMultifractal};

    #[test]
    fn test_flat() {
        let map = HeightMap::flat(9);
        assert_eq!(map.size(), 9);
        assert_eq!(map.samples().len(), 81);
        assert_eq!(map.min(), 0.0);
        assert_eq!(map.max(), 0.0);
    }

    #[test]
    fn test_from_samples_rejects_wrong_length() {
        assert!(HeightMap::from_samples(3, vec![0.0; 8]).is_none());
        let map = HeightMap::from_samples(2, vec![1.0, -2.0, 3.0, 0.5]).unwrap();
        assert_eq!(map.min(), -2.0);
        assert_eq!(map.max(), 3.0);
        assert_eq!(map.get(1, 0), Some(-2.0));
        assert_eq!(map.get(0, 1), Some(3.0));
        assert_eq!(map.get(2, 0), None);
    }

    #[test]
    fn test_generate_flat_field() {
        let points = vec![DVec3::ZERO; 9];
        let map = HeightMap::generate(&FlatHeightField::new(4.0), &points, 3, 1.0).unwrap();
        assert!(map.samples().iter().all(|&h| h == 4.0));
    }

    #[test]
    fn test_generate_matches_field() {
        let field = HybridMultifractal::new(FractalParams {
            frequency: 0.05,
            ..Default::default()
        });
        let points: Vec<DVec3> = (0..25)
            .map(|i| DVec3::new((i % 5) as f64 * 3.0, 0.0, (i / 5) as f64 * 3.0))
            .collect();

        let map = HeightMap::generate(&field, &points, 5, 4.0).unwrap();
        for (i, p) in points.iter().enumerate() {
            assert_eq!(map.samples()[i], field.sample(*p, 4.0) as f32);
        }
        assert!(map.min() <= map.max());
    }

    #[test]
    fn test_generate_rejects_wrong_point_count() {
        let points = vec![DVec3::ZERO; 8];
        assert!(HeightMap::generate(&FlatHeightField::default(), &points, 3, 1.0).is_none());
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps").join("root.png");
        let map = HeightMap::from_samples(2, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        map.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded.dimensions(), (2, 2));
        assert_eq!(loaded.get_pixel(0, 0).0[0], 0);
        assert_eq!(loaded.get_pixel(1, 1).0[0], 255);
    }
}
