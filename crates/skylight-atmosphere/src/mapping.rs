//! Parameterizations between texture coordinates and `(r, mu)` pairs.
//!
//! `r` is the distance from the planet centre and `mu` the cosine of the
//! zenith angle of a ray (or of the sun, for the sun-altitude mapping).

use glam::Vec2;

use crate::lut::{texel_coord_to_unit, unit_to_texel_coord};
use crate::params::AtmosphereParams;

/// Horizon-split mapping used by the transmittance table.
///
/// `v` encodes altitude through `rho = sqrt(r² - Rg²)`. The right half of
/// `u` (`u >= 0.5`) holds rays that escape to space, parameterized by the
/// distance to the top of the atmosphere, zenith at the right edge. The
/// left half holds rays that hit the ground, parameterized by the distance
/// to the ground, nadir at the left edge. The horizon sits between the two
/// centre texels.
///
/// Round trips are exact except where the path length is identically zero:
/// upward rays from the top boundary and downward rays from the ground
/// collapse onto a single texel column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransmittanceMapping {
    planet_radius: f64,
    atmosphere_radius: f64,
    width: f32,
    height: f32,
}

impl TransmittanceMapping {
    pub fn new(params: &AtmosphereParams, width: u32, height: u32) -> Self {
        Self {
            planet_radius: params.planet_radius as f64,
            atmosphere_radius: params.atmosphere_radius as f64,
            width: width.max(2) as f32,
            height: height.max(2) as f32,
        }
    }

    fn horizon_length(&self) -> f64 {
        (self.atmosphere_radius.powi(2) - self.planet_radius.powi(2))
            .max(0.0)
            .sqrt()
    }

    pub fn encode(&self, r: f32, mu: f32) -> Vec2 {
        let (rg, rt) = (self.planet_radius, self.atmosphere_radius);
        let r = (r as f64).clamp(rg, rt);
        let mu = (mu as f64).clamp(-1.0, 1.0);
        let h = self.horizon_length();
        let rho = (r * r - rg * rg).max(0.0).sqrt();
        let half = self.width * 0.5;
        let v = unit_to_texel_coord((rho / h) as f32, self.height);

        let mu_horizon = -rho / r;
        let u = if mu >= mu_horizon {
            let d = (-r * mu + (r * r * (mu * mu - 1.0) + rt * rt).max(0.0).sqrt()).max(0.0);
            let (d_min, d_max) = (rt - r, rho + h);
            let x = normalized(d, d_min, d_max);
            0.5 + 0.5 * unit_to_texel_coord((1.0 - x) as f32, half)
        } else {
            let d = (-r * mu - (r * r * (mu * mu - 1.0) + rg * rg).max(0.0).sqrt()).max(0.0);
            let (d_min, d_max) = (r - rg, rho);
            let x = normalized(d, d_min, d_max);
            0.5 * unit_to_texel_coord(x as f32, half)
        };
        Vec2::new(u, v)
    }

    pub fn decode(&self, uv: Vec2) -> (f32, f32) {
        let (rg, rt) = (self.planet_radius, self.atmosphere_radius);
        let h = self.horizon_length();
        let half = self.width * 0.5;
        let x_r = texel_coord_to_unit(uv.y, self.height).clamp(0.0, 1.0) as f64;
        let rho = h * x_r;
        let r = (rho * rho + rg * rg).sqrt().min(rt);

        let mu = if uv.x >= 0.5 {
            let x = 1.0 - texel_coord_to_unit((uv.x - 0.5) * 2.0, half).clamp(0.0, 1.0) as f64;
            let (d_min, d_max) = (rt - r, rho + h);
            let d = d_min + x * (d_max - d_min);
            if d < 1e-9 {
                1.0
            } else {
                (h * h - rho * rho - d * d) / (2.0 * r * d)
            }
        } else {
            let x = texel_coord_to_unit(uv.x * 2.0, half).clamp(0.0, 1.0) as f64;
            let (d_min, d_max) = (r - rg, rho);
            let d = d_min + x * (d_max - d_min);
            if d < 1e-9 {
                -1.0
            } else {
                -(rho * rho + d * d) / (2.0 * r * d)
            }
        };
        (r as f32, mu.clamp(-1.0, 1.0) as f32)
    }
}

fn normalized(d: f64, d_min: f64, d_max: f64) -> f64 {
    let span = d_max - d_min;
    if span <= 1e-12 {
        0.0
    } else {
        ((d - d_min) / span).clamp(0.0, 1.0)
    }
}

/// Linear mapping of sun zenith cosine on `u` and altitude on `v`, shared by
/// the multiple-scattering and irradiance tables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunAltitudeMapping {
    planet_radius: f32,
    atmosphere_radius: f32,
    width: f32,
    height: f32,
}

impl SunAltitudeMapping {
    pub fn new(params: &AtmosphereParams, width: u32, height: u32) -> Self {
        Self {
            planet_radius: params.planet_radius,
            atmosphere_radius: params.atmosphere_radius,
            width: width.max(2) as f32,
            height: height.max(2) as f32,
        }
    }

    pub fn encode(&self, r: f32, mu_s: f32) -> Vec2 {
        let altitude = (r - self.planet_radius) / (self.atmosphere_radius - self.planet_radius);
        Vec2::new(
            unit_to_texel_coord(mu_s.clamp(-1.0, 1.0) * 0.5 + 0.5, self.width),
            unit_to_texel_coord(altitude.clamp(0.0, 1.0), self.height),
        )
    }

    pub fn decode(&self, uv: Vec2) -> (f32, f32) {
        let mu_s = texel_coord_to_unit(uv.x, self.width).clamp(0.0, 1.0) * 2.0 - 1.0;
        let altitude = texel_coord_to_unit(uv.y, self.height).clamp(0.0, 1.0);
        let r = self.planet_radius + altitude * (self.atmosphere_radius - self.planet_radius);
        (r, mu_s)
    }
}
