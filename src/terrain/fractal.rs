//! Hybrid multifractal height field (Musgrave, "Texturing & Modeling", p. 502)
//!
//! Low-lying areas stay smooth while ridges pick up detail: each octave is
//! weighted by the running product of the previous octaves' signals.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use super::height_field::HeightField;
use crate::core::types::DVec3;

/// Size of the per-instance exponent table. Octave counts are clamped below it.
pub const MAX_OCTAVES: usize = 20;

/// Parameters controlling the fractal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalParams {
    pub seed: u32,
    pub frequency: f64,         // Point scale applied before the first octave
    pub roughness: f64,         // Fractal dimension H of the roughest areas
    pub lacunarity: f64,        // Gap between successive frequencies
    pub offset: f64,            // Added to every octave ("above sea level")
    pub height_scale: f64,      // Multiplier on the raw fractal value
    pub base_octaves: f64,      // Octaves used for root nodes
    pub octaves_per_level: f64, // Extra octaves per quadtree level
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            frequency: 1.0 / 100_000.0,
            roughness: 0.25,
            lacunarity: 2.0,
            offset: 0.7,
            height_scale: 2_000.0,
            base_octaves: 4.0,
            octaves_per_level: 1.0,
        }
    }
}

/// Hybrid multifractal over 3D Perlin noise.
///
/// The spectral weights `frequency^-roughness` are computed once per instance
/// at construction, so two instances with different parameters never share
/// state.
pub struct HybridMultifractal {
    params: FractalParams,
    noise: Perlin,
    exponents: [f64; MAX_OCTAVES],
}

impl HybridMultifractal {
    /// Create a new fractal with the given parameters
    pub fn new(params: FractalParams) -> Self {
        let mut exponents = [0.0; MAX_OCTAVES];
        let mut frequency = 1.0;
        for exponent in exponents.iter_mut() {
            *exponent = f64::powf(frequency, -params.roughness);
            frequency *= params.lacunarity;
        }

        Self {
            noise: Perlin::new(params.seed),
            params,
            exponents,
        }
    }

    /// Get fractal parameters
    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    /// Precomputed spectral weight for octave `i`.
    pub fn exponent(&self, i: usize) -> f64 {
        self.exponents[i.min(MAX_OCTAVES - 1)]
    }

    fn noise_at(&self, p: DVec3) -> f64 {
        self.noise.get([p.x, p.y, p.z])
    }

    /// Raw fractal value before `height_scale` is applied.
    pub fn fractal(&self, point: DVec3, octaves: f64) -> f64 {
        let octaves = if octaves.is_finite() {
            octaves.clamp(1.0, (MAX_OCTAVES - 1) as f64)
        } else {
            1.0
        };
        let whole = octaves as usize;
        let lacunarity = self.params.lacunarity;
        let offset = self.params.offset;

        let mut p = point * self.params.frequency;

        // First octave seeds the weight
        let mut result = (self.noise_at(p) + offset) * self.exponents[0];
        let mut weight = result;
        p *= lacunarity;

        for i in 1..whole {
            weight = weight.min(1.0);
            let signal = (self.noise_at(p) + offset) * self.exponents[i];
            result += weight * signal;
            weight *= signal;
            p *= lacunarity;
        }

        let remainder = octaves - whole as f64;
        if remainder > 0.0 {
            result += remainder * self.noise_at(p) * self.exponents[whole];
        }

        result
    }
}

impl HeightField for HybridMultifractal {
    fn sample(&self, point: DVec3, octaves: f64) -> f64 {
        self.fractal(point, octaves) * self.params.height_scale
    }

    fn octaves_for_level(&self, level: u32) -> f64 {
        self.params.base_octaves + level as f64 * self.params.octaves_per_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_params() -> FractalParams {
        FractalParams {
            frequency: 0.01,
            height_scale: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_fractal_params_default() {
        let params = FractalParams::default();
        assert_eq!(params.seed, 12345);
        assert_eq!(params.lacunarity, 2.0);
        assert_eq!(params.roughness, 0.25);
        assert_eq!(params.base_octaves, 4.0);
    }

    #[test]
    fn test_exponent_table() {
        let fractal = HybridMultifractal::new(unit_params());
        assert_eq!(fractal.exponent(0), 1.0);
        // 2^-0.25
        assert!((fractal.exponent(1) - 2.0_f64.powf(-0.25)).abs() < 1e-12);
        // Spectral weights fall off with frequency
        for i in 1..MAX_OCTAVES {
            assert!(fractal.exponent(i) < fractal.exponent(i - 1));
        }
    }

    #[test]
    fn test_sample_is_deterministic() {
        let fractal = HybridMultifractal::new(unit_params());
        let points = [
            DVec3::new(0.5, 0.25, 0.125),
            DVec3::new(120.0, -40.0, 33.3),
            DVec3::new(-6.0e6, 1.0, 2.0),
        ];

        for p in points {
            let h1 = fractal.sample(p, 6.5);
            let h2 = fractal.sample(p, 6.5);
            assert_eq!(h1, h2, "Height should be consistent at {:?}", p);
            assert!(h1.is_finite());
        }
    }

    #[test]
    fn test_independent_instances_agree() {
        let a = HybridMultifractal::new(unit_params());
        let b = HybridMultifractal::new(unit_params());
        let p = DVec3::new(13.7, 2.1, -8.4);
        assert_eq!(a.sample(p, 5.0), b.sample(p, 5.0));
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = HybridMultifractal::new(FractalParams { seed: 1, ..unit_params() });
        let b = HybridMultifractal::new(FractalParams { seed: 2, ..unit_params() });
        let p = DVec3::new(50.3, 50.7, 12.9);
        assert_ne!(a.sample(p, 5.0), b.sample(p, 5.0));
    }

    #[test]
    fn test_fractional_octave_blends_between_whole_counts() {
        let fractal = HybridMultifractal::new(unit_params());
        let p = DVec3::new(31.4, 15.9, 26.5);

        let h4 = fractal.fractal(p, 4.0);
        let h45 = fractal.fractal(p, 4.5);

        // The partial octave adds exactly half of the next octave's raw noise
        let next = p * 0.01 * 2.0_f64.powi(4);
        let raw = Perlin::new(12345).get([next.x, next.y, next.z]);
        let expected = h4 + 0.5 * raw * fractal.exponent(4);
        assert!((h45 - expected).abs() < 1e-12);
    }

    #[test]
    fn test_octaves_clamped_to_table() {
        let fractal = HybridMultifractal::new(unit_params());
        let p = DVec3::new(1.5, 2.5, 3.5);

        let capped = fractal.fractal(p, (MAX_OCTAVES - 1) as f64);
        assert_eq!(fractal.fractal(p, 1000.0), capped);
        assert_eq!(fractal.fractal(p, f64::INFINITY), fractal.fractal(p, 1.0));
        assert_eq!(fractal.fractal(p, f64::NAN), fractal.fractal(p, 1.0));
        assert_eq!(fractal.fractal(p, -3.0), fractal.fractal(p, 1.0));
    }

    #[test]
    fn test_octaves_for_level() {
        let fractal = HybridMultifractal::new(FractalParams {
            base_octaves: 3.0,
            octaves_per_level: 0.5,
            ..Default::default()
        });
        assert_eq!(fractal.octaves_for_level(0), 3.0);
        assert_eq!(fractal.octaves_for_level(4), 5.0);
    }

    #[test]
    fn test_height_scale_applied() {
        let base = HybridMultifractal::new(unit_params());
        let scaled = HybridMultifractal::new(FractalParams { height_scale: 10.0, ..unit_params() });
        let p = DVec3::new(7.0, 8.0, 9.0);
        assert!((scaled.sample(p, 5.0) - 10.0 * base.sample(p, 5.0)).abs() < 1e-9);
    }
}
