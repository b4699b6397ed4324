//! Sky irradiance on an upward-facing surface.
//!
//! Rayleigh and Mie contributions are stored in separate tables, without
//! the phase function, per unit of solar illuminance.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;
use tracing::debug;

use crate::lut::{Lut2D, fill_rows, texel_center, worker_count};
use crate::mapping::SunAltitudeMapping;
use crate::medium::{ISOTROPIC_PHASE, distance_to_boundary, integrate_step, sample_medium};
use crate::params::AtmosphereParams;
use crate::transmittance::TransmittanceLut;

pub const IRRADIANCE_WIDTH: u32 = 64;
pub const IRRADIANCE_HEIGHT: u32 = 16;
const ZENITH_SAMPLES: u32 = 8;
const AZIMUTH_SAMPLES: u32 = 16;
const RAY_STEPS: u32 = 16;

/// Phase-free Rayleigh and Mie in-scattering along one direction.
fn inscatter_along(
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
    let dt = exit.distance / RAY_STEPS as f32;
    let mut throughput = Vec3::ONE;
    let mut rayleigh = Vec3::ZERO;
    let mut mie = Vec3::ZERO;
    for i in 0..RAY_STEPS {
        let p = origin + dir * ((i as f32 + 0.5) * dt);
        let radius = p.length();
        let medium = sample_medium(params, radius - params.planet_radius);
        let sun_t = transmittance.to_sun(radius, p.dot(sun) / radius);

        let (r_step, step_t) =
            integrate_step(medium.rayleigh_scattering * sun_t, medium.extinction, dt);
        let (m_step, _) = integrate_step(sun_t * medium.mie_scattering, medium.extinction, dt);
        rayleigh += throughput * r_step;
        mie += throughput * m_step;
        throughput *= step_t;
    }
    (rayleigh, mie)
}

/// Hemispherical, cosine-weighted sky irradiance `(rayleigh, mie)` at radius
/// `r` for a sun with zenith cosine `mu_s`.
pub fn compute_irradiance(
    params: &AtmosphereParams,
    transmittance: &TransmittanceLut,
    r: f32,
    mu_s: f32,
) -> (Vec3, Vec3) {
    let sun = Vec3::new((1.0 - mu_s * mu_s).max(0.0).sqrt(), mu_s, 0.0);
    let d_theta = FRAC_PI_2 / ZENITH_SAMPLES as f32;
    let d_phi = TAU / AZIMUTH_SAMPLES as f32;
    let mut rayleigh = Vec3::ZERO;
    let mut mie = Vec3::ZERO;
    for i in 0..ZENITH_SAMPLES {
        let theta = (i as f32 + 0.5) * d_theta;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let weight = cos_theta * sin_theta * d_theta * d_phi;
        for j in 0..AZIMUTH_SAMPLES {
            let phi = (j as f32 + 0.5) * d_phi;
            let dir = Vec3::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin());
            let (l_r, l_m) = inscatter_along(params, transmittance, r, dir, sun);
            rayleigh += l_r * weight;
            mie += l_m * weight;
        }
    }
    (rayleigh, mie)
}

/// Rayleigh and Mie sky irradiance tables.
#[derive(Clone, Debug)]
pub struct IrradianceLuts {
    rayleigh: Lut2D<Vec3>,
    mie: Lut2D<Vec3>,
    mapping: SunAltitudeMapping,
}

impl IrradianceLuts {
    pub fn build(params: &AtmosphereParams, transmittance: &TransmittanceLut, threads: usize) -> Self {
        Self::build_sized(params, transmittance, IRRADIANCE_WIDTH, IRRADIANCE_HEIGHT, threads)
    }

    pub fn build_sized(
        params: &AtmosphereParams,
        transmittance: &TransmittanceLut,
        width: u32,
        height: u32,
        threads: usize,
    ) -> Self {
        let mapping = SunAltitudeMapping::new(params, width, height);
        let mut rayleigh = Lut2D::new(width, height);
        let mut mie = Lut2D::new(width, height);
        let (w, h) = (rayleigh.width(), rayleigh.height());

        let mut combined = vec![(Vec3::ZERO, Vec3::ZERO); (w * h) as usize];
        fill_rows(&mut combined, w as usize, worker_count(threads), |x, y| {
            let (r, mu_s) = mapping.decode(texel_center(x as u32, y as u32, w, h));
            compute_irradiance(params, transmittance, r, mu_s)
        });
        for (i, (r, m)) in combined.into_iter().enumerate() {
            let (x, y) = (i as u32 % w, i as u32 / w);
            rayleigh.set(x, y, r);
            mie.set(x, y, m);
        }
        debug!(width, height, "irradiance LUTs built");
        Self {
            rayleigh,
            mie,
            mapping,
        }
    }

    pub fn rayleigh(&self) -> &Lut2D<Vec3> {
        &self.rayleigh
    }

    pub fn mie(&self) -> &Lut2D<Vec3> {
        &self.mie
    }

    /// Phase-free `(rayleigh, mie)` irradiance per unit illuminance.
    pub fn sample(&self, r: f32, mu_s: f32) -> (Vec3, Vec3) {
        let uv = self.mapping.encode(r, mu_s);
        (self.rayleigh.sample(uv), self.mie.sample(uv))
    }

    /// Irradiance on an upward surface per unit illuminance, with isotropic
    /// scattering applied.
    pub fn sky_irradiance(&self, r: f32, mu_s: f32) -> Vec3 {
        let (rayleigh, mie) = self.sample(r, mu_s);
        (rayleigh + mie) * ISOTROPIC_PHASE
    }

    /// Radiance of a uniform sky that would deliver [`Self::sky_irradiance`].
    pub fn ambient_radiance(&self, r: f32, mu_s: f32) -> Vec3 {
        self.sky_irradiance(r, mu_s) / PI
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> (AtmosphereParams, IrradianceLuts) {
        let params = AtmosphereParams::earth();
        let transmittance = TransmittanceLut::build(&params, 4);
        let luts = IrradianceLuts::build_sized(&params, &transmittance, 16, 8, 4);
        (params, luts)
    }

    #[test]
    fn test_irradiance_non_negative() {
        let (_, luts) = build();
        for t in luts.rayleigh().data().iter().chain(luts.mie().data()) {
            assert!(t.min_element() >= 0.0 && t.is_finite(), "texel {t:?}");
        }
    }

    #[test]
    fn test_daylight_sky_is_blue() {
        let (params, luts) = build();
        let (rayleigh, _) = luts.sample(params.planet_radius + 0.2, 0.7);
        assert!(rayleigh.z > rayleigh.x, "rayleigh irradiance {rayleigh:?}");
        let ambient = luts.ambient_radiance(params.planet_radius + 0.2, 0.7);
        assert!(ambient.max_element() > 0.0);
    }

    #[test]
    fn test_night_is_darker_than_day() {
        let (params, luts) = build();
        let r = params.planet_radius + 0.2;
        let day = luts.sky_irradiance(r, 0.7);
        let night = luts.sky_irradiance(r, -0.7);
        assert!(day.y > night.y * 100.0, "day {day:?} night {night:?}");
    }
}
