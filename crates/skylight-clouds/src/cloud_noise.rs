//! Fractal noise driving cloud shapes.
//!
//! Base shapes are fBm over simplex noise; detail is billowed simplex
//! noise at a higher frequency used to erode the edges.

use glam::{DVec3, Vec3};
use noise::{NoiseFn, Simplex};

/// Octave settings for one fBm stack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FbmParams {
    pub octaves: u32,
    /// Frequency of the first octave, cycles per kilometre.
    pub frequency: f64,
    pub lacunarity: f64,
    pub persistence: f64,
}

impl FbmParams {
    pub const BASE: Self = Self {
        octaves: 4,
        frequency: 0.08,
        lacunarity: 2.0,
        persistence: 0.5,
    };

    pub const DETAIL: Self = Self {
        octaves: 3,
        frequency: 0.6,
        lacunarity: 2.3,
        persistence: 0.45,
    };
}

/// Seeded cloud noise.
pub struct CloudNoise {
    base: Simplex,
    detail: Simplex,
    base_params: FbmParams,
    detail_params: FbmParams,
    detail_scale: f64,
}

impl std::fmt::Debug for CloudNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudNoise")
            .field("base_params", &self.base_params)
            .field("detail_params", &self.detail_params)
            .field("detail_scale", &self.detail_scale)
            .finish()
    }
}

impl CloudNoise {
    pub fn new(seed: u32, detail_scale: f32) -> Self {
        Self {
            base: Simplex::new(seed),
            detail: Simplex::new(seed.wrapping_add(0x9e37_79b9)),
            base_params: FbmParams::BASE,
            detail_params: FbmParams::DETAIL,
            detail_scale: detail_scale.max(0.0) as f64,
        }
    }

    /// fBm in `[0, 1]`, normalized by the total octave amplitude.
    fn fbm(noise: &Simplex, p: DVec3, params: FbmParams, billow: bool) -> f64 {
        let mut total = 0.0;
        let mut norm = 0.0;
        let mut frequency = params.frequency;
        let mut amplitude = 1.0;
        for _ in 0..params.octaves.max(1) {
            let q = p * frequency;
            let n = noise.get([q.x, q.y, q.z]);
            total += if billow { 1.0 - n.abs() } else { (n + 1.0) * 0.5 } * amplitude;
            norm += amplitude;
            frequency *= params.lacunarity;
            amplitude *= params.persistence;
        }
        (total / norm).clamp(0.0, 1.0)
    }

    /// Large-scale cloud shape at a point in kilometres, `[0, 1]`.
    pub fn base(&self, p: Vec3) -> f32 {
        Self::fbm(&self.base, p.as_dvec3(), self.base_params, false) as f32
    }

    /// Low-frequency weather pattern used for the coverage mask, `[0, 1]`.
    pub fn weather(&self, p: Vec3) -> f32 {
        let params = FbmParams {
            octaves: 2,
            frequency: self.base_params.frequency * 0.25,
            ..self.base_params
        };
        Self::fbm(&self.base, p.as_dvec3() + DVec3::splat(173.0), params, false) as f32
    }

    /// Billowy erosion detail, `[0, 1]`.
    pub fn detail(&self, p: Vec3) -> f32 {
        let params = FbmParams {
            frequency: self.detail_params.frequency * self.detail_scale,
            ..self.detail_params
        };
        Self::fbm(&self.detail, p.as_dvec3(), params, true) as f32
    }
}
