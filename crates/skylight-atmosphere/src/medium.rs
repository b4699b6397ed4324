//! Density profiles, phase functions and planet ray geometry.

use std::f32::consts::PI;

use glam::Vec3;
use skylight_math::{safe_exp, safe_exp_vec3};

use crate::params::AtmosphereParams;

/// Phase function of an isotropic medium, `1 / 4π`.
pub const ISOTROPIC_PHASE: f32 = 1.0 / (4.0 * PI);

/// Exponential density `exp(-h / H)`; altitudes below ground count as ground.
#[inline]
pub fn exponential_density(altitude: f32, scale_height: f32) -> f32 {
    safe_exp(-altitude.max(0.0) / scale_height)
}

/// Gaussian ozone layer `exp(-((h - c) / w)²)`.
#[inline]
pub fn ozone_density(altitude: f32, center: f32, width: f32) -> f32 {
    let x = (altitude - center) / width;
    safe_exp(-x * x)
}

/// Scattering and extinction coefficients at one point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MediumSample {
    pub rayleigh_scattering: Vec3,
    pub mie_scattering: f32,
    pub extinction: Vec3,
}

impl MediumSample {
    /// Total scattering coefficient.
    pub fn scattering(&self) -> Vec3 {
        self.rayleigh_scattering + Vec3::splat(self.mie_scattering)
    }
}

/// Coefficients of the medium `altitude` kilometres above the ground.
pub fn sample_medium(params: &AtmosphereParams, altitude: f32) -> MediumSample {
    let rayleigh = exponential_density(altitude, params.rayleigh_scale_height);
    let mie = exponential_density(altitude, params.mie_scale_height);
    let ozone = ozone_density(altitude, params.ozone_center, params.ozone_width);

    let rayleigh_scattering = params.rayleigh_scattering * rayleigh;
    let mie_scattering = params.mie_scattering * mie;
    let extinction = rayleigh_scattering
        + Vec3::splat(params.mie_extinction() * mie)
        + params.ozone_absorption * ozone;
    MediumSample {
        rayleigh_scattering,
        mie_scattering,
        extinction,
    }
}

#[inline]
pub fn rayleigh_phase(cos_theta: f32) -> f32 {
    3.0 / (16.0 * PI) * (1.0 + cos_theta * cos_theta)
}

/// Henyey-Greenstein phase function.
pub fn henyey_greenstein_phase(cos_theta: f32, g: f32) -> f32 {
    let g2 = g * g;
    let denom = (1.0 + g2 - 2.0 * g * cos_theta).max(1e-6);
    (1.0 - g2) / (4.0 * PI * denom * denom.sqrt())
}

/// Cornette-Shanks phase function, a Henyey-Greenstein variant with a
/// Rayleigh-like back lobe.
pub fn cornette_shanks_phase(cos_theta: f32, g: f32) -> f32 {
    let g2 = g * g;
    let k = 3.0 / (8.0 * PI) * (1.0 - g2) / (2.0 + g2);
    let denom = (1.0 + g2 - 2.0 * g * cos_theta).max(1e-6);
    k * (1.0 + cos_theta * cos_theta) / (denom * denom.sqrt())
}

/// Integrate a constant source over one step of a homogeneous segment.
///
/// Returns `∫₀^dt source·exp(-σ·s) ds` and the step transmittance
/// `exp(-σ·dt)`. Exact for any step size, so thick steps do not add energy.
pub fn integrate_step(source: Vec3, extinction: Vec3, dt: f32) -> (Vec3, Vec3) {
    let optical = extinction * dt;
    let step_transmittance = safe_exp_vec3(-optical);
    let weight = Vec3::new(
        step_weight(extinction.x, optical.x, dt),
        step_weight(extinction.y, optical.y, dt),
        step_weight(extinction.z, optical.z, dt),
    );
    (source * weight, step_transmittance)
}

fn step_weight(extinction: f32, optical: f32, dt: f32) -> f32 {
    if extinction > 1e-12 {
        -(-optical).exp_m1() / extinction
    } else {
        dt
    }
}

/// Where a ray from radius `r` with zenith cosine `mu` leaves the medium.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayExit {
    pub distance: f32,
    pub hits_ground: bool,
}

fn discriminant(r: f64, mu: f64, radius: f64) -> f64 {
    r * r * (mu * mu - 1.0) + radius * radius
}

/// Distance from radius `r` to the top of the atmosphere along `mu`.
pub fn distance_to_top(params: &AtmosphereParams, r: f32, mu: f32) -> f32 {
    let (r, mu) = (r as f64, mu.clamp(-1.0, 1.0) as f64);
    let disc = discriminant(r, mu, params.atmosphere_radius as f64).max(0.0);
    (-r * mu + disc.sqrt()).max(0.0) as f32
}

/// Distance from radius `r` to the ground along `mu`. Only meaningful when
/// [`ray_hits_ground`] holds.
pub fn distance_to_ground(params: &AtmosphereParams, r: f32, mu: f32) -> f32 {
    let (r, mu) = (r as f64, mu.clamp(-1.0, 1.0) as f64);
    let disc = discriminant(r, mu, params.planet_radius as f64).max(0.0);
    (-r * mu - disc.sqrt()).max(0.0) as f32
}

/// True when a ray from radius `r` with zenith cosine `mu` meets the planet.
pub fn ray_hits_ground(params: &AtmosphereParams, r: f32, mu: f32) -> bool {
    mu < 0.0
        && discriminant(r as f64, mu as f64, params.planet_radius as f64) >= 0.0
        && r >= params.planet_radius
}

/// Cosine of the zenith angle of the geometric horizon seen from radius `r`.
pub fn horizon_cosine(params: &AtmosphereParams, r: f32) -> f32 {
    let ratio = (params.planet_radius / r.max(params.planet_radius)).min(1.0);
    -(1.0 - ratio * ratio).max(0.0).sqrt()
}

/// Distance to whichever boundary the ray reaches first.
pub fn distance_to_boundary(params: &AtmosphereParams, r: f32, mu: f32) -> RayExit {
    if ray_hits_ground(params, r, mu) {
        RayExit {
            distance: distance_to_ground(params, r, mu),
            hits_ground: true,
        }
    } else {
        RayExit {
            distance: distance_to_top(params, r, mu),
            hits_ground: false,
        }
    }
}

/// Radius and zenith cosine after travelling `t` along a ray that started at
/// radius `r` with zenith cosine `mu`.
pub fn advance(r: f32, mu: f32, t: f32) -> (f32, f32) {
    let (r, mu, t) = (r as f64, mu as f64, t as f64);
    let r_t = (r * r + 2.0 * r * mu * t + t * t).max(0.0).sqrt();
    let mu_t = if r_t > 0.0 { (r * mu + t) / r_t } else { mu };
    (r_t as f32, mu_t.clamp(-1.0, 1.0) as f32)
}
