//! Per-frame cloud map over the upper hemisphere.
//!
//! The map is indexed by view direction with a paraboloid projection and
//! stores, per texel, the noise sampled where a ground ray crosses the
//! middle of the cloud shell: R base density, G detail, B coverage mask,
//! A cloud type (drives the height gradient).

use std::time::Instant;

use glam::{Vec2, Vec3, Vec4};
use skylight_atmosphere::{Lut2D, texel_center};
use skylight_math::ray_sphere_intersect;
use tracing::info;

use crate::cloud_noise::CloudNoise;
use crate::layer::CloudLayer;

pub const CLOUD_MAP_SIZE: u32 = 256;

/// Lowest direction elevation stored; flatter rays reuse the horizon row.
const MIN_ELEVATION_SIN: f32 = 0.01;

/// Map an upper-hemisphere direction to `[0, 1]²`. Directions below the
/// horizon are folded onto it.
pub fn paraboloid_encode(dir: Vec3) -> Vec2 {
    let d = Vec3::new(dir.x, dir.y.max(0.0), dir.z).normalize_or(Vec3::Y);
    Vec2::new(d.x, d.z) / (1.0 + d.y) * 0.5 + Vec2::splat(0.5)
}

/// Inverse of [`paraboloid_encode`]. Points outside the unit disc are pulled
/// back onto its rim (the horizon).
pub fn paraboloid_decode(uv: Vec2) -> Vec3 {
    let mut p = uv * 2.0 - Vec2::ONE;
    let r2 = p.length_squared();
    if r2 > 1.0 {
        p /= r2.sqrt();
    }
    let r2 = p.length_squared();
    Vec3::new(2.0 * p.x, 1.0 - r2, 2.0 * p.y) / (1.0 + r2)
}

/// Cloud map for one frame.
#[derive(Clone, Debug)]
pub struct CloudMap {
    lut: Lut2D<Vec4>,
    wind_offset: Vec3,
}

impl CloudMap {
    pub fn build(
        layer: &CloudLayer,
        noise: &CloudNoise,
        planet_radius: f32,
        wind_offset: Vec3,
        threads: usize,
    ) -> Self {
        Self::build_sized(layer, noise, planet_radius, wind_offset, CLOUD_MAP_SIZE, threads)
    }

    pub fn build_sized(
        layer: &CloudLayer,
        noise: &CloudNoise,
        planet_radius: f32,
        wind_offset: Vec3,
        size: u32,
        threads: usize,
    ) -> Self {
        let start = Instant::now();
        let origin = Vec3::new(0.0, planet_radius, 0.0);
        let mid = layer.mid_radius();
        let lut = Lut2D::build(size, size, threads, |x, y| {
            let mut dir = paraboloid_decode(texel_center(x, y, size, size));
            dir.y = dir.y.max(MIN_ELEVATION_SIN);
            let dir = dir.normalize();
            let hit = ray_sphere_intersect(origin, dir, mid);
            let p = origin + dir * hit.far.max(0.0) + wind_offset;
            let weather = noise.weather(p);
            let cloud_type = noise.weather(p * 0.5 + Vec3::splat(91.0));
            Vec4::new(noise.base(p), noise.detail(p), weather, cloud_type)
        });
        info!(
            size,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "built cloud map"
        );
        Self { lut, wind_offset }
    }

    pub fn lut(&self) -> &Lut2D<Vec4> {
        &self.lut
    }

    /// Wind displacement the map was baked with.
    pub fn wind_offset(&self) -> Vec3 {
        self.wind_offset
    }

    /// Map texel seen along a view direction.
    pub fn sample(&self, dir: Vec3) -> Vec4 {
        self.lut.sample(paraboloid_encode(dir))
    }
}
