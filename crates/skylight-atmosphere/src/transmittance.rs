//! Transmittance from any point of the atmosphere to its boundary.

use glam::Vec3;
use skylight_math::{safe_exp_vec3, smoothstep};
use tracing::debug;

use crate::lut::{Lut2D, texel_center};
use crate::mapping::TransmittanceMapping;
use crate::medium::{advance, distance_to_boundary, sample_medium};
use crate::params::AtmosphereParams;

pub const TRANSMITTANCE_WIDTH: u32 = 256;
pub const TRANSMITTANCE_HEIGHT: u32 = 64;
/// Trapezoid steps along each ray.
pub const TRANSMITTANCE_STEPS: u32 = 40;

/// Transmittance along the ray from radius `r` with zenith cosine `mu` up to
/// the first boundary it reaches (ground or top of atmosphere).
pub fn compute_transmittance(params: &AtmosphereParams, r: f32, mu: f32, steps: u32) -> Vec3 {
    let steps = steps.max(1);
    let exit = distance_to_boundary(params, r, mu);
    if exit.distance <= 0.0 {
        return Vec3::ONE;
    }
    let dt = exit.distance / steps as f32;
    let mut optical_depth = Vec3::ZERO;
    for i in 0..=steps {
        let (radius, _) = advance(r, mu, i as f32 * dt);
        let weight = if i == 0 || i == steps { 0.5 } else { 1.0 };
        optical_depth += sample_medium(params, radius - params.planet_radius).extinction * weight;
    }
    safe_exp_vec3(-optical_depth * dt)
}

/// Precomputed transmittance over `(r, mu)`.
#[derive(Clone, Debug)]
pub struct TransmittanceLut {
    lut: Lut2D<Vec3>,
    mapping: TransmittanceMapping,
    planet_radius: f32,
    sun_angular_radius: f32,
}

impl TransmittanceLut {
    pub fn build(params: &AtmosphereParams, threads: usize) -> Self {
        Self::build_sized(params, TRANSMITTANCE_WIDTH, TRANSMITTANCE_HEIGHT, threads)
    }

    pub fn build_sized(params: &AtmosphereParams, width: u32, height: u32, threads: usize) -> Self {
        let mapping = TransmittanceMapping::new(params, width, height);
        let lut = Lut2D::build(width, height, threads, |x, y| {
            let (r, mu) = mapping.decode(texel_center(x, y, width, height));
            compute_transmittance(params, r, mu, TRANSMITTANCE_STEPS)
        });
        debug!(width, height, "transmittance LUT built");
        Self {
            lut,
            mapping,
            planet_radius: params.planet_radius,
            sun_angular_radius: params.sun_angular_radius,
        }
    }

    pub fn lut(&self) -> &Lut2D<Vec3> {
        &self.lut
    }

    pub fn mapping(&self) -> &TransmittanceMapping {
        &self.mapping
    }

    /// Transmittance from `(r, mu)` to the boundary, bilinearly filtered.
    pub fn sample(&self, r: f32, mu: f32) -> Vec3 {
        self.lut.sample(self.mapping.encode(r, mu))
    }

    /// Sunlight transmittance at radius `r` for a sun with zenith cosine
    /// `mu_s`, faded across the planet shadow over the sun's angular radius.
    pub fn to_sun(&self, r: f32, mu_s: f32) -> Vec3 {
        let r = r.max(self.planet_radius);
        let sin_horizon = self.planet_radius / r;
        let cos_horizon = -(1.0 - sin_horizon * sin_horizon).max(0.0).sqrt();
        let half_width = sin_horizon * self.sun_angular_radius;
        let visible = smoothstep(-half_width, half_width, mu_s - cos_horizon);
        if visible <= 0.0 {
            return Vec3::ZERO;
        }
        self.sample(r, mu_s.max(cos_horizon)) * visible
    }
}
