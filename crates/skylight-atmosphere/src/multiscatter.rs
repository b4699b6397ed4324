//! Multiple-scattering transfer table.
//!
//! Each texel holds the isotropic multiple-scattering luminance factor `Ψ`
//! (red channel) and the transfer factor `f_ms` (green channel) for a sun
//! zenith cosine and altitude. Higher orders are summed as the geometric
//! series `Ψ = L₂ / (1 − f_ms)`. At runtime a sample with scattering
//! coefficient `σ_s` gains `σ_s · Ψ · E` of radiance under illuminance `E`.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use skylight_math::luminance;
use tracing::debug;

use crate::lut::{Lut2D, texel_center};
use crate::mapping::SunAltitudeMapping;
use crate::medium::{ISOTROPIC_PHASE, distance_to_boundary, integrate_step, sample_medium};
use crate::params::AtmosphereParams;
use crate::transmittance::TransmittanceLut;

pub const MULTISCATTER_SIZE: u32 = 32;
/// Sphere directions per texel, as a `n × n` stratified grid.
pub const MULTISCATTER_DIRECTION_GRID: u32 = 8;
pub const MULTISCATTER_STEPS: u32 = 20;

/// Second-order luminance and transfer factor gathered along one direction.
fn integrate_direction(
    params: &AtmosphereParams,
    transmittance: &TransmittanceLut,
    r: f32,
    dir: Vec3,
    sun: Vec3,
) -> (Vec3, Vec3) {
    let exit = distance_to_boundary(params, r, dir.y);
    if exit.distance <= 0.0 {
        return (Vec3::ZERO, Vec3::ZERO);
    }
    let origin = Vec3::new(0.0, r, 0.0);
    let dt = exit.distance / MULTISCATTER_STEPS as f32;
    let mut throughput = Vec3::ONE;
    let mut radiance = Vec3::ZERO;
    let mut transfer = Vec3::ZERO;

    for i in 0..MULTISCATTER_STEPS {
        let p = origin + dir * ((i as f32 + 0.5) * dt);
        let radius = p.length();
        let medium = sample_medium(params, radius - params.planet_radius);
        let scattering = medium.scattering();
        let sun_t = transmittance.to_sun(radius, p.dot(sun) / radius);

        let (inscatter, step_t) =
            integrate_step(scattering * sun_t * ISOTROPIC_PHASE, medium.extinction, dt);
        let (gathered, _) = integrate_step(scattering, medium.extinction, dt);
        radiance += throughput * inscatter;
        transfer += throughput * gathered;
        throughput *= step_t;
    }

    if exit.hits_ground {
        let ground = (origin + dir * exit.distance).normalize_or(Vec3::Y);
        let mu_g = ground.dot(sun);
        let sun_t = transmittance.to_sun(params.planet_radius, mu_g);
        radiance += throughput * sun_t * (mu_g.max(0.0) * params.ground_albedo / PI);
    }
    (radiance, transfer)
}

/// Multiple-scattering factors `(Ψ, f_ms)` at radius `r` for a sun with
/// zenith cosine `mu_s`.
pub fn compute_multiscatter(
    params: &AtmosphereParams,
    transmittance: &TransmittanceLut,
    r: f32,
    mu_s: f32,
) -> Vec2 {
    let sun = Vec3::new((1.0 - mu_s * mu_s).max(0.0).sqrt(), mu_s, 0.0);
    let n = MULTISCATTER_DIRECTION_GRID;
    let mut second_order = Vec3::ZERO;
    let mut transfer = Vec3::ZERO;
    for i in 0..n {
        for j in 0..n {
            let cos_theta = 1.0 - 2.0 * (i as f32 + 0.5) / n as f32;
            let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
            let phi = TAU * (j as f32 + 0.5) / n as f32;
            let dir = Vec3::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin());
            let (l, f) = integrate_direction(params, transmittance, r, dir, sun);
            second_order += l;
            transfer += f;
        }
    }
    let count = (n * n) as f32;
    // Uniform sphere weights (4π / N) cancel the isotropic phase (1 / 4π).
    let second_order = second_order / count;
    let transfer = transfer / count;
    let psi = second_order / (Vec3::ONE - transfer).max(Vec3::splat(1e-3));
    Vec2::new(luminance(psi), luminance(transfer))
}

/// Precomputed multiple-scattering factors.
#[derive(Clone, Debug)]
pub struct MultiScatterLut {
    lut: Lut2D<Vec2>,
    mapping: SunAltitudeMapping,
}

impl MultiScatterLut {
    pub fn build(params: &AtmosphereParams, transmittance: &TransmittanceLut, threads: usize) -> Self {
        Self::build_sized(params, transmittance, MULTISCATTER_SIZE, MULTISCATTER_SIZE, threads)
    }

    pub fn build_sized(
        params: &AtmosphereParams,
        transmittance: &TransmittanceLut,
        width: u32,
        height: u32,
        threads: usize,
    ) -> Self {
        let mapping = SunAltitudeMapping::new(params, width, height);
        let lut = Lut2D::build(width, height, threads, |x, y| {
            let (r, mu_s) = mapping.decode(texel_center(x, y, width, height));
            compute_multiscatter(params, transmittance, r, mu_s)
        });
        debug!(width, height, "multiple-scattering LUT built");
        Self { lut, mapping }
    }

    pub fn lut(&self) -> &Lut2D<Vec2> {
        &self.lut
    }

    /// `(Ψ, f_ms)` at radius `r` for sun zenith cosine `mu_s`.
    pub fn sample(&self, r: f32, mu_s: f32) -> Vec2 {
        self.lut.sample(self.mapping.encode(r, mu_s))
    }

    /// Multiple-scattering luminance factor `Ψ`.
    pub fn psi(&self, r: f32, mu_s: f32) -> f32 {
        self.sample(r, mu_s).x
    }
}
