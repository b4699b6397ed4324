//! Runtime sky reconstruction for arbitrary view directions.

use glam::{Vec3, Vec4Swizzles};
use skylight_celestial::{CelestialState, StarField, moon_disc, solar_disc};
use skylight_config::SkyConfig;
use skylight_math::smoothstep;

use crate::medium::cornette_shanks_phase;
use crate::model::AtmosphereModel;
use crate::params::AtmosphereParams;
use crate::sky_view::SkyViewLut;
use crate::transmittance::TransmittanceLut;

/// Extent of the forward Mie halo around the sun.
const HALO_ANGLE_DEG: f32 = 30.0;
const HALO_SCALE: f32 = 0.02;
/// Disc radiances relative to the solar illuminance.
const SUN_DISC_RADIANCE: f32 = 40.0;
const CORONA_RADIANCE: f32 = 0.5;
const MOON_DISC_RADIANCE: f32 = 0.05;

/// Artistic controls of the reconstructed sky.
#[derive(Clone, Debug)]
pub struct SkySettings {
    /// Radiance floor at full night.
    pub night_floor: Vec3,
    pub halo_strength: f32,
    pub stars: StarField,
}

impl Default for SkySettings {
    fn default() -> Self {
        Self::from_config(&SkyConfig::default(), 0.0)
    }
}

impl SkySettings {
    /// Settings for an observer at `latitude_deg`, which tilts the star pole.
    pub fn from_config(config: &SkyConfig, latitude_deg: f64) -> Self {
        Self {
            night_floor: Vec3::from_array(config.night_floor).max(Vec3::ZERO),
            halo_strength: config.halo_strength.max(0.0),
            stars: StarField::new(config.star_density, config.star_brightness)
                .with_latitude(latitude_deg),
        }
    }
}

/// Radiance contributions towards one view direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SkyComponents {
    /// Atmospheric in-scattering from the sky-view table.
    pub scattered: Vec3,
    pub halo: Vec3,
    /// Solar photosphere and corona.
    pub sun: Vec3,
    pub moon: Vec3,
    pub stars: Vec3,
    pub night_floor: Vec3,
}

impl SkyComponents {
    pub fn total(&self) -> Vec3 {
        self.scattered + self.halo + self.sun + self.moon + self.stars + self.night_floor
    }
}

/// Combines the sky-view and transmittance tables with the celestial
/// bodies for one frame.
#[derive(Clone, Copy, Debug)]
pub struct SkyRenderer<'a> {
    params: &'a AtmosphereParams,
    transmittance: &'a TransmittanceLut,
    sky_view: &'a SkyViewLut,
    celestial: &'a CelestialState,
    settings: &'a SkySettings,
    camera_radius: f32,
}

/// Below-horizon rays are looked up along the horizon.
fn horizon_clamped(dir: Vec3) -> Vec3 {
    if dir.y >= 0.0 {
        dir
    } else {
        Vec3::new(dir.x, 0.0, dir.z).normalize_or(Vec3::Z)
    }
}

impl<'a> SkyRenderer<'a> {
    pub fn new(
        model: &'a AtmosphereModel,
        sky_view: &'a SkyViewLut,
        celestial: &'a CelestialState,
        settings: &'a SkySettings,
    ) -> Self {
        Self {
            params: model.params(),
            transmittance: model.transmittance(),
            sky_view,
            celestial,
            settings,
            camera_radius: model.camera_radius(sky_view.camera_altitude()),
        }
    }

    /// Final sky radiance towards `dir`.
    pub fn radiance(&self, dir: Vec3) -> Vec3 {
        self.components(dir).total()
    }

    pub fn components(&self, dir: Vec3) -> SkyComponents {
        let dir = dir.normalize_or(Vec3::Y);
        let celestial = self.celestial;
        let solar = self.params.solar_irradiance;
        let lookup = horizon_clamped(dir);

        let scattered = self.sky_view.sample(lookup).xyz();
        let view_transmittance = self.transmittance.sample(self.camera_radius, lookup.y);

        let cos_sun = dir.dot(celestial.sun_direction);
        let halo_falloff = smoothstep(HALO_ANGLE_DEG.to_radians().cos(), 1.0, cos_sun);
        let halo = celestial.sun_illuminance(solar)
            * view_transmittance
            * (cornette_shanks_phase(cos_sun, self.params.mie_anisotropy)
                * halo_falloff
                * self.settings.halo_strength
                * HALO_SCALE);
        let night_floor = self.settings.night_floor * celestial.star_visibility;

        let mut components = SkyComponents {
            scattered,
            halo,
            night_floor,
            ..SkyComponents::default()
        };
        if dir.y < 0.0 {
            return components;
        }

        let sun = solar_disc(
            dir,
            celestial.sun_direction,
            celestial.eclipse_amount,
            &celestial.disc,
        );
        components.sun = solar
            * view_transmittance
            * (sun.disc * SUN_DISC_RADIANCE + sun.corona * CORONA_RADIANCE);

        let moon = moon_disc(
            dir,
            celestial.moon_direction,
            celestial.moon_light_direction,
            celestial.earthshine,
            &celestial.disc,
        );
        components.moon = solar
            * celestial.moon_color
            * view_transmittance
            * (moon.intensity() * celestial.moon_disc_intensity * MOON_DISC_RADIANCE);

        let occluded = (1.0 - moon.coverage) * (1.0 - sun.disc);
        components.stars = self.settings.stars.radiance(
            dir,
            celestial.julian_day,
            celestial.star_visibility,
        ) * view_transmittance
            * occluded;
        components
    }
}
