//! Single scattering along a view ray, with multiple scattering folded in
//! from the transfer table.

use glam::Vec3;
use skylight_math::ray_sphere_intersect;

use crate::medium::{cornette_shanks_phase, integrate_step, rayleigh_phase, sample_medium};
use crate::multiscatter::MultiScatterLut;
use crate::params::AtmosphereParams;
use crate::transmittance::TransmittanceLut;

/// A directional light illuminating the atmosphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSource {
    /// Unit direction towards the light.
    pub direction: Vec3,
    /// Illuminance at the top of the atmosphere.
    pub illuminance: Vec3,
}

impl LightSource {
    pub fn new(direction: Vec3, illuminance: Vec3) -> Self {
        Self {
            direction: direction.normalize_or(Vec3::Y),
            illuminance,
        }
    }

    fn is_dark(&self) -> bool {
        self.illuminance.max_element() <= 0.0
    }
}

/// Radiance scattered towards the viewer and transmittance of the segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatteringResult {
    pub inscatter: Vec3,
    pub transmittance: Vec3,
}

impl Default for ScatteringResult {
    fn default() -> Self {
        Self {
            inscatter: Vec3::ZERO,
            transmittance: Vec3::ONE,
        }
    }
}

/// Tables consulted while marching.
#[derive(Clone, Copy, Debug)]
pub struct ScatteringTables<'a> {
    pub transmittance: &'a TransmittanceLut,
    pub multiscatter: Option<&'a MultiScatterLut>,
}

/// March from `origin` along `dir` through the atmosphere, stopping at the
/// ground, the top of the atmosphere or `max_distance`, whichever is first.
///
/// Positions are planet-centred kilometres; `dir` must be normalized.
pub fn integrate_scattering(
    params: &AtmosphereParams,
    tables: ScatteringTables<'_>,
    origin: Vec3,
    dir: Vec3,
    max_distance: f32,
    lights: &[LightSource],
    steps: u32,
) -> ScatteringResult {
    let atmosphere = ray_sphere_intersect(origin, dir, params.atmosphere_radius).forward();
    if atmosphere.is_empty() {
        return ScatteringResult::default();
    }
    let mut t_end = atmosphere.far.min(max_distance.max(0.0));
    let ground = ray_sphere_intersect(origin, dir, params.planet_radius);
    if ground.hits_ahead() && ground.near > 0.0 {
        t_end = t_end.min(ground.near);
    }
    let t_start = atmosphere.near;
    if t_end <= t_start {
        return ScatteringResult::default();
    }

    let steps = steps.max(1);
    let dt = (t_end - t_start) / steps as f32;
    let g = params.mie_anisotropy;

    let mut result = ScatteringResult::default();
    for i in 0..steps {
        let p = origin + dir * (t_start + (i as f32 + 0.5) * dt);
        let radius = p.length();
        let medium = sample_medium(params, radius - params.planet_radius);
        let scattering = medium.scattering();

        let mut source = Vec3::ZERO;
        for light in lights.iter().filter(|light| !light.is_dark()) {
            let cos_theta = dir.dot(light.direction);
            let mu_s = p.dot(light.direction) / radius;
            let sun_t = tables.transmittance.to_sun(radius, mu_s);
            let single = medium.rayleigh_scattering * rayleigh_phase(cos_theta)
                + Vec3::splat(medium.mie_scattering * cornette_shanks_phase(cos_theta, g));
            source += single * sun_t * light.illuminance;
            if let Some(multiscatter) = tables.multiscatter {
                source += scattering * multiscatter.psi(radius, mu_s) * light.illuminance;
            }
        }

        let (inscatter, step_t) = integrate_step(source, medium.extinction, dt);
        result.inscatter += result.transmittance * inscatter;
        result.transmittance *= step_t;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> (AtmosphereParams, TransmittanceLut, MultiScatterLut) {
        let params = AtmosphereParams::earth();
        let transmittance = TransmittanceLut::build(&params, 4);
        let multiscatter = MultiScatterLut::build_sized(&params, &transmittance, 16, 16, 4);
        (params, transmittance, multiscatter)
    }

    #[test]
    fn test_dark_lights_scatter_nothing() {
        let (params, transmittance, multiscatter) = tables();
        let tables = ScatteringTables {
            transmittance: &transmittance,
            multiscatter: Some(&multiscatter),
        };
        let origin = params.camera_position(0.2);
        let lights = [LightSource::new(Vec3::Y, Vec3::ZERO)];
        let result = integrate_scattering(&params, tables, origin, Vec3::Y, f32::MAX, &lights, 30);
        assert_eq!(result.inscatter, Vec3::ZERO);
        assert!(result.transmittance.min_element() > 0.5);
    }

    #[test]
    fn test_zenith_sky_is_blue() {
        let (params, transmittance, _) = tables();
        let tables = ScatteringTables {
            transmittance: &transmittance,
            multiscatter: None,
        };
        let origin = params.camera_position(0.2);
        let sun = Vec3::new(0.0, 0.5, 0.866);
        let lights = [LightSource::new(sun, params.solar_irradiance)];
        let result = integrate_scattering(&params, tables, origin, Vec3::Y, f32::MAX, &lights, 30);
        let l = result.inscatter;
        assert!(l.z > l.y && l.y > l.x, "zenith radiance {l:?}");
    }

    #[test]
    fn test_multiscatter_adds_light() {
        let (params, transmittance, multiscatter) = tables();
        let origin = params.camera_position(0.2);
        let sun = Vec3::new(0.0, 0.3, 0.954).normalize();
        let lights = [LightSource::new(sun, params.solar_irradiance)];
        let dir = Vec3::new(0.6, 0.3, -0.74).normalize();
        let single = integrate_scattering(
            &params,
            ScatteringTables {
                transmittance: &transmittance,
                multiscatter: None,
            },
            origin,
            dir,
            f32::MAX,
            &lights,
            30,
        );
        let multiple = integrate_scattering(
            &params,
            ScatteringTables {
                transmittance: &transmittance,
                multiscatter: Some(&multiscatter),
            },
            origin,
            dir,
            f32::MAX,
            &lights,
            30,
        );
        assert!(multiple.inscatter.cmpgt(single.inscatter).all());
        assert_eq!(multiple.transmittance, single.transmittance);
    }

    #[test]
    fn test_max_distance_limits_segment() {
        let (params, transmittance, _) = tables();
        let tables = ScatteringTables {
            transmittance: &transmittance,
            multiscatter: None,
        };
        let origin = params.camera_position(0.2);
        let dir = Vec3::new(1.0, 0.01, 0.0).normalize();
        let lights = [LightSource::new(Vec3::Y, params.solar_irradiance)];
        let near = integrate_scattering(&params, tables, origin, dir, 5.0, &lights, 16);
        let far = integrate_scattering(&params, tables, origin, dir, 50.0, &lights, 16);
        assert!(near.transmittance.cmpgt(far.transmittance).all());
        assert!(far.inscatter.cmpgt(near.inscatter).all());
    }

    #[test]
    fn test_ray_missing_atmosphere() {
        let (params, transmittance, _) = tables();
        let tables = ScatteringTables {
            transmittance: &transmittance,
            multiscatter: None,
        };
        let origin = Vec3::new(0.0, params.atmosphere_radius + 10.0, 0.0);
        let lights = [LightSource::new(Vec3::Y, params.solar_irradiance)];
        let result = integrate_scattering(&params, tables, origin, Vec3::Y, f32::MAX, &lights, 16);
        assert_eq!(result, ScatteringResult::default());
    }
}
