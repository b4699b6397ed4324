//! Volumetric cloud raymarcher.

use std::f32::consts::PI;

use glam::{Vec3, Vec4};
use skylight_atmosphere::{
    AtmosphereModel, LightSource, cornette_shanks_phase, henyey_greenstein_phase, integrate_step,
};
use skylight_celestial::CelestialState;
use skylight_math::{hash_to_unit, hash_u32, lerp, ray_sphere_intersect, safe_exp};
use tracing::debug;

use crate::cloud_map::CloudMap;
use crate::cloud_noise::CloudNoise;
use crate::layer::{CLOUD_EXTINCTION_PER_KM, CloudDensity, CloudLayer};

/// Densities below this are treated as clear air.
pub const DENSITY_THRESHOLD: f32 = 1e-3;
/// Marching stops once the view ray is this opaque.
pub const MIN_TRANSMITTANCE: f32 = 0.01;

const FORWARD_G: f32 = 0.8;
const BACK_G: f32 = -0.15;
/// Back-scatter boost standing in for multiple scattering inside the cloud.
const BACK_SCATTER_BOOST: f32 = 2.16;
/// Longest secondary march toward a light, km.
const LIGHT_MARCH_KM: f32 = 3.0;

/// Radiance scattered toward the viewer by the cloud layer and the fraction
/// of the background still visible through it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudResult {
    pub scattering: Vec3,
    pub transmittance: f32,
}

impl Default for CloudResult {
    fn default() -> Self {
        Self {
            scattering: Vec3::ZERO,
            transmittance: 1.0,
        }
    }
}

impl CloudResult {
    /// Composite over the radiance behind the clouds.
    pub fn over(&self, background: Vec3) -> Vec3 {
        background * self.transmittance + self.scattering
    }
}

/// Per-frame cloud evaluator. Read-only and shareable across threads.
#[derive(Clone, Debug)]
pub struct CloudRenderer<'a> {
    model: &'a AtmosphereModel,
    field: CloudDensity<'a>,
    map: Option<&'a CloudMap>,
    lights: Vec<LightSource>,
}

impl<'a> CloudRenderer<'a> {
    pub fn new(
        model: &'a AtmosphereModel,
        layer: &'a CloudLayer,
        noise: &'a CloudNoise,
        map: Option<&'a CloudMap>,
        celestial: &CelestialState,
        time_s: f32,
    ) -> Self {
        let lights: Vec<LightSource> = model
            .lights(celestial)
            .into_iter()
            .filter(|light| light.illuminance.max_element() > 0.0)
            .collect();
        debug!(
            coverage = layer.coverage,
            style = ?layer.style,
            lights = lights.len(),
            "cloud renderer"
        );
        Self {
            model,
            field: CloudDensity {
                layer,
                noise,
                wind_offset: layer.wind_offset(time_s),
            },
            map,
            lights,
        }
    }

    pub fn layer(&self) -> &CloudLayer {
        self.field.layer
    }

    fn map_texel(&self, view_dir: Vec3) -> Option<Vec4> {
        self.map.map(|map| map.sample(view_dir))
    }

    /// Cloud density at planet-centred `p` seen along `view_dir`.
    pub fn density(&self, p: Vec3, view_dir: Vec3) -> f32 {
        self.field.sample(p, self.map_texel(view_dir))
    }

    /// Transmittance through the cloud from `p` toward a light.
    fn light_march(&self, p: Vec3, light_dir: Vec3, texel: Option<Vec4>) -> f32 {
        let layer = self.field.layer;
        let exit = ray_sphere_intersect(p, light_dir, layer.top_radius);
        let length = exit.far.clamp(0.0, LIGHT_MARCH_KM);
        if length <= 0.0 {
            return 1.0;
        }
        let steps = layer.light_steps;
        let ds = length / steps as f32;
        let optical_depth: f32 = (0..steps)
            .map(|j| {
                let q = p + light_dir * ((j as f32 + 0.5) * ds);
                self.field.extinction(q, texel) * ds
            })
            .sum();
        safe_exp(-optical_depth)
    }

    /// Uniform radiance lighting `p`: ground bounce at the cloud base,
    /// open sky at the top.
    fn ambient(&self, p: Vec3) -> Vec3 {
        let params = self.model.params();
        let irradiance = self.model.irradiance();
        let transmittance = self.model.transmittance();
        let r = p.length();
        let up = p / r.max(1e-6);
        let ground_r = params.planet_radius;

        let mut sky = Vec3::ZERO;
        let mut ground = Vec3::ZERO;
        for light in &self.lights {
            let mu_s = up.dot(light.direction);
            sky += irradiance.ambient_radiance(r, mu_s) * light.illuminance;
            let direct = transmittance.to_sun(ground_r, mu_s) * mu_s.max(0.0);
            let diffuse = irradiance.sky_irradiance(ground_r, mu_s);
            ground += (direct + diffuse) * light.illuminance * (params.ground_albedo / PI);
        }
        ground.lerp(sky, self.field.layer.height_fraction(p))
    }

    /// Fraction of light from `dir` reaching `origin` through the clouds,
    /// without lighting. Used to shadow the ground.
    pub fn shadow_transmittance(&self, origin: Vec3, dir: Vec3) -> f32 {
        let layer = self.field.layer;
        if !layer.enabled || layer.coverage <= 0.0 {
            return 1.0;
        }
        let interval = layer.intersect(origin, dir, self.model.params().planet_radius);
        if interval.is_empty() {
            return 1.0;
        }
        let steps = (layer.primary_steps / 2).max(1);
        let dt = interval.length() / steps as f32;
        let texel = self.map_texel(dir);
        let optical_depth: f32 = (0..steps)
            .map(|i| {
                let p = origin + dir * (interval.near + (i as f32 + 0.5) * dt);
                self.field.extinction(p, texel) * dt
            })
            .sum();
        safe_exp(-optical_depth)
    }

    /// March the view ray through the cloud shell.
    ///
    /// `origin` is planet-centred km, `dir` normalized. `jitter_seed`
    /// offsets the first sample by a hashed fraction of a step.
    pub fn march(&self, origin: Vec3, dir: Vec3, jitter_seed: u32) -> CloudResult {
        let layer = self.field.layer;
        if !layer.enabled || layer.coverage <= 0.0 {
            return CloudResult::default();
        }
        let interval = layer.intersect(origin, dir, self.model.params().planet_radius);
        if interval.is_empty() {
            return CloudResult::default();
        }

        let steps = layer.primary_steps;
        let dt = interval.length() / steps as f32;
        let jitter = hash_to_unit(hash_u32(jitter_seed));
        let texel = self.map_texel(dir);

        let mut scattering = Vec3::ZERO;
        let mut transmittance = 1.0_f32;
        for i in 0..steps {
            let t = interval.near + (i as f32 + jitter) * dt;
            let p = origin + dir * t;
            let density = self.field.sample(p, texel);
            if density < DENSITY_THRESHOLD {
                continue;
            }
            let extinction = density * CLOUD_EXTINCTION_PER_KM;

            let mut source = self.ambient(p);
            for light in &self.lights {
                let light_t = self.light_march(p, light.direction, texel);
                let cos_theta = dir.dot(light.direction);
                let phase = lerp(
                    henyey_greenstein_phase(cos_theta, BACK_G) * BACK_SCATTER_BOOST,
                    cornette_shanks_phase(cos_theta, FORWARD_G),
                    light_t * transmittance,
                );
                let sunlight = self.model.light_transmittance(p, light.direction);
                source += light.illuminance * sunlight * (light_t * phase);
            }

            let (step_scattering, step_t) =
                integrate_step(source * extinction, Vec3::splat(extinction), dt);
            scattering += step_scattering * transmittance;
            transmittance *= step_t.x;
            if transmittance < MIN_TRANSMITTANCE {
                transmittance = 0.0;
                break;
            }
        }
        CloudResult {
            scattering,
            transmittance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skylight_atmosphere::AtmosphereParams;
    use skylight_celestial::CelestialSettings;
    use skylight_config::{CloudConfig, CloudStyle};
    use skylight_math::direction_from_angles;
    use std::sync::OnceLock;

    fn model() -> &'static AtmosphereModel {
        static MODEL: OnceLock<AtmosphereModel> = OnceLock::new();
        MODEL.get_or_init(|| AtmosphereModel::new(AtmosphereParams::earth(), 4).unwrap())
    }

    fn day() -> CelestialState {
        CelestialState::from_directions(
            direction_from_angles(0.8, 0.5),
            direction_from_angles(-0.6, 2.0),
            2451545.0,
            &CelestialSettings::default(),
        )
    }

    fn layer(coverage: f32, density: f32) -> CloudLayer {
        let config = CloudConfig {
            coverage,
            density,
            style: CloudStyle::Procedural,
            ..CloudConfig::default()
        };
        CloudLayer::from_config(&config, model().params().planet_radius)
    }

    fn camera() -> Vec3 {
        model().params().camera_position(0.2)
    }

    #[test]
    fn test_zero_coverage_is_clear() {
        let layer = layer(0.0, 1.0);
        let noise = CloudNoise::new(layer.seed, layer.detail_scale);
        let celestial = day();
        let clouds = CloudRenderer::new(model(), &layer, &noise, None, &celestial, 0.0);
        for i in 0..50 {
            let dir = direction_from_angles(0.05 + i as f32 * 0.03, i as f32 * 0.4);
            assert_eq!(clouds.march(camera(), dir, i), CloudResult::default());
        }
    }

    #[test]
    fn test_ray_into_ground_is_clear() {
        let layer = layer(1.0, 1.0);
        let noise = CloudNoise::new(layer.seed, layer.detail_scale);
        let celestial = day();
        let clouds = CloudRenderer::new(model(), &layer, &noise, None, &celestial, 0.0);
        let down = direction_from_angles(-0.4, 1.0);
        assert_eq!(clouds.march(camera(), down, 3), CloudResult::default());
    }

    #[test]
    fn test_overcast_blocks_and_scatters() {
        let layer = layer(1.0, 1.0);
        let noise = CloudNoise::new(layer.seed, layer.detail_scale);
        let celestial = day();
        let clouds = CloudRenderer::new(model(), &layer, &noise, None, &celestial, 0.0);
        let result = clouds.march(camera(), Vec3::Y, 1);
        assert!(result.transmittance < 0.5, "overcast zenith T {}", result.transmittance);
        assert!(result.scattering.min_element() > 0.0);
        assert!(result.scattering.is_finite());
    }

    #[test]
    fn test_transmittance_monotone_in_density() {
        let noise = CloudNoise::new(1337, 2.5);
        let celestial = day();
        for (i, el) in [0.15_f32, 0.5, 1.0, 1.5].into_iter().enumerate() {
            let dir = direction_from_angles(el, i as f32 * 1.3);
            let mut previous = 1.0_f32;
            for density in [0.0, 0.05, 0.1, 0.3, 0.6, 1.0, 2.0] {
                let layer = layer(0.7, density);
                let clouds = CloudRenderer::new(model(), &layer, &noise, None, &celestial, 0.0);
                let result = clouds.march(camera(), dir, 42);
                assert!(
                    (0.0..=1.0).contains(&result.transmittance),
                    "T out of range: {}",
                    result.transmittance
                );
                assert!(
                    result.transmittance <= previous + 1e-6,
                    "T rose from {previous} to {} at density {density}",
                    result.transmittance
                );
                previous = result.transmittance;
            }
        }
    }

    #[test]
    fn test_night_clouds_darker_than_day() {
        let layer = layer(1.0, 1.0);
        let noise = CloudNoise::new(layer.seed, layer.detail_scale);
        let day = day();
        let night = CelestialState::from_directions(
            direction_from_angles(-0.5, 0.5),
            direction_from_angles(-0.6, 2.0),
            2451545.0,
            &CelestialSettings::default(),
        );
        let lit = CloudRenderer::new(model(), &layer, &noise, None, &day, 0.0)
            .march(camera(), Vec3::Y, 9);
        let dark = CloudRenderer::new(model(), &layer, &noise, None, &night, 0.0)
            .march(camera(), Vec3::Y, 9);
        assert!(
            dark.scattering.max_element() < lit.scattering.max_element() * 0.01,
            "night {:?} vs day {:?}",
            dark.scattering,
            lit.scattering
        );
        assert!((dark.transmittance - lit.transmittance).abs() < 1e-6);
    }

    #[test]
    fn test_shadow_transmittance() {
        let overcast = layer(1.0, 1.0);
        let clear = layer(0.0, 1.0);
        let noise = CloudNoise::new(overcast.seed, overcast.detail_scale);
        let celestial = day();
        let ground = model().params().camera_position(0.001);
        let shadowed = CloudRenderer::new(model(), &overcast, &noise, None, &celestial, 0.0)
            .shadow_transmittance(ground, Vec3::Y);
        assert!(shadowed < 0.5, "overcast shadow {shadowed}");
        let open = CloudRenderer::new(model(), &clear, &noise, None, &celestial, 0.0)
            .shadow_transmittance(ground, Vec3::Y);
        assert_eq!(open, 1.0);
    }

    #[test]
    fn test_composite_over_background() {
        let result = CloudResult {
            scattering: Vec3::splat(0.2),
            transmittance: 0.5,
        };
        assert_eq!(result.over(Vec3::ONE), Vec3::splat(0.7));
        assert_eq!(CloudResult::default().over(Vec3::X), Vec3::X);
    }
}
