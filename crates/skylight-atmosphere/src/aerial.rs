//! Aerial perspective for scene geometry: local height fog followed by a
//! distance-weighted blend of large-scale atmospheric scattering.
//!
//! Scene positions are metres with the ground plane at `y = 0`; they are
//! converted to planet-centred kilometres for the atmosphere stage.

use glam::Vec3;
use skylight_celestial::CelestialState;
use skylight_config::FogConfig;
use skylight_math::{safe_div, safe_exp, saturate};

use crate::integrate::{ScatteringResult, integrate_scattering};
use crate::medium::ISOTROPIC_PHASE;
use crate::model::AtmosphereModel;

/// Full strength of the atmosphere stage at the maximum blend distance.
const MAX_ATMOSPHERE_BLEND: f32 = 0.7;
/// Rays flatter than this use the constant-density optical depth.
const HORIZONTAL_RAY_EPSILON: f32 = 1e-4;

/// Exponential height fog with a sigmoid ground layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightFog {
    pub enabled: bool,
    pub base_height: f32,
    pub scale_height: f32,
    /// Scattering coefficient at the base height, per metre.
    pub density: f32,
    /// Absorption coefficient at the base height, per metre.
    pub absorption: f32,
    /// Height at which the ground layer starts to thin out.
    pub layer_height: f32,
    pub layer_thickness: f32,
    pub layer_density: f32,
}

impl Default for HeightFog {
    fn default() -> Self {
        Self::from(&FogConfig::default())
    }
}

impl From<&FogConfig> for HeightFog {
    fn from(config: &FogConfig) -> Self {
        Self {
            enabled: config.enabled,
            base_height: config.base_height_m,
            scale_height: config.scale_height_m.max(1e-3),
            density: config.density.max(0.0),
            absorption: config.absorption.max(0.0),
            layer_height: config.layer_height_m,
            layer_thickness: config.layer_thickness_m.max(1e-3),
            layer_density: config.layer_density.max(0.0),
        }
    }
}

/// Fog transmittance and in-scattered radiance along a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogResult {
    pub transmittance: f32,
    pub inscatter: Vec3,
}

impl HeightFog {
    fn extinction_per_density(&self) -> f32 {
        safe_div(self.density + self.absorption, self.density)
    }

    /// Scattering share of the extinction.
    pub fn albedo(&self) -> f32 {
        saturate(safe_div(self.density, self.density + self.absorption))
    }

    /// Exponential profile scattering coefficient at `height`.
    pub fn exponential_density(&self, height: f32) -> f32 {
        self.density * safe_exp(-(height - self.base_height) / self.scale_height)
    }

    /// Ground layer coefficient: flat up to `layer_height`, then a sigmoid
    /// falloff over `layer_thickness`.
    pub fn layer_density_at(&self, height: f32) -> f32 {
        let x = (height - self.layer_height - self.layer_thickness * 0.5)
            / (self.layer_thickness * 0.1);
        self.layer_density / (1.0 + safe_exp(x))
    }

    /// Extinction coefficient at `height`.
    pub fn extinction_at(&self, height: f32) -> f32 {
        self.exponential_density(height) * self.extinction_per_density()
            + self.layer_density_at(height)
    }

    /// Optical depth between two scene points. The exponential part is
    /// integrated in closed form, the ground layer with `steps` midpoint
    /// samples.
    pub fn optical_depth(&self, from: Vec3, to: Vec3, steps: u32) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        let length = from.distance(to);
        if length <= 0.0 {
            return 0.0;
        }
        let dy = to.y - from.y;
        let rho_from = self.exponential_density(from.y);
        let exponential = if (dy / length).abs() < HORIZONTAL_RAY_EPSILON {
            rho_from * length
        } else {
            let rho_to = self.exponential_density(to.y);
            (rho_from - rho_to) * self.scale_height * length / dy
        };

        let steps = steps.max(1);
        let mut layer = 0.0;
        for i in 0..steps {
            let t = (i as f32 + 0.5) / steps as f32;
            layer += self.layer_density_at(from.y + dy * t);
        }
        layer *= length / steps as f32;

        exponential.max(0.0) * self.extinction_per_density() + layer
    }

    /// Fog over the segment, lit by `light` (radiance per unit scattering).
    pub fn evaluate(&self, from: Vec3, to: Vec3, steps: u32, light: Vec3) -> FogResult {
        let transmittance = safe_exp(-self.optical_depth(from, to, steps));
        FogResult {
            transmittance,
            inscatter: light * (self.albedo() * (1.0 - transmittance)),
        }
    }
}

/// Cubic ease in `[0, 1]`.
fn ease(x: f32) -> f32 {
    let x = saturate(x);
    x * x * (3.0 - 2.0 * x)
}

/// Per-frame compositor tinting scene colours by distance.
#[derive(Clone, Copy, Debug)]
pub struct AerialPerspective<'a> {
    model: &'a AtmosphereModel,
    celestial: &'a CelestialState,
    fog: HeightFog,
    night_floor: Vec3,
    max_blend_distance: f32,
    steps: u32,
}

impl<'a> AerialPerspective<'a> {
    pub fn new(
        model: &'a AtmosphereModel,
        celestial: &'a CelestialState,
        fog: &FogConfig,
        night_floor: Vec3,
    ) -> Self {
        Self {
            model,
            celestial,
            fog: HeightFog::from(fog),
            night_floor,
            max_blend_distance: fog.max_blend_distance_m.max(1.0),
            steps: fog.aerial_steps.max(1),
        }
    }

    pub fn fog(&self) -> &HeightFog {
        &self.fog
    }

    /// Planet-centred kilometres of a scene point in metres.
    pub fn to_planet(&self, scene: Vec3) -> Vec3 {
        let planet_radius = self.model.params().planet_radius;
        Vec3::new(
            scene.x * 1e-3,
            planet_radius + (scene.y * 1e-3).max(1e-3),
            scene.z * 1e-3,
        )
    }

    /// Light scattered by fog: the sun gated by `sun_visibility`, the sky
    /// ambient and the night floor.
    pub fn fog_light(&self, camera: Vec3, sun_visibility: f32) -> Vec3 {
        let celestial = self.celestial;
        let solar = self.model.params().solar_irradiance;
        let position = self.to_planet(camera);
        let sun = celestial.sun_color
            * celestial.sun_illuminance(solar)
            * self.model.light_transmittance(position, celestial.sun_direction)
            * (saturate(sun_visibility) * ISOTROPIC_PHASE);
        let ambient = self.model.ambient_radiance(position, celestial);
        sun + ambient + self.night_floor * celestial.star_visibility
    }

    /// Stage one: local height fog between camera and fragment.
    pub fn height_fog(&self, camera: Vec3, fragment: Vec3, sun_visibility: f32) -> FogResult {
        self.fog.evaluate(
            camera,
            fragment,
            self.steps,
            self.fog_light(camera, sun_visibility),
        )
    }

    /// Stage two: atmospheric scattering between camera and fragment.
    pub fn atmosphere(&self, camera: Vec3, fragment: Vec3) -> ScatteringResult {
        let from = self.to_planet(camera);
        let to = self.to_planet(fragment);
        let offset = to - from;
        let distance = offset.length();
        if distance <= 0.0 {
            return ScatteringResult::default();
        }
        integrate_scattering(
            self.model.params(),
            self.model.tables(),
            from,
            offset / distance,
            distance,
            &self.model.lights(self.celestial),
            self.steps,
        )
    }

    /// Weight of the atmosphere stage at `distance` metres.
    pub fn blend_weight(&self, distance: f32) -> f32 {
        MAX_ATMOSPHERE_BLEND * ease(distance / self.max_blend_distance)
    }

    /// Tint `color` seen at `fragment` from `camera`.
    pub fn apply(&self, color: Vec3, camera: Vec3, fragment: Vec3, sun_visibility: f32) -> Vec3 {
        let fog = self.height_fog(camera, fragment, sun_visibility);
        let fogged = color * fog.transmittance + fog.inscatter;
        let weight = self.blend_weight(camera.distance(fragment));
        if weight <= 0.0 {
            return fogged;
        }
        let atmosphere = self.atmosphere(camera, fragment);
        let scattered = fogged * atmosphere.transmittance + atmosphere.inscatter;
        fogged.lerp(scattered, weight)
    }
}
