//! Per-frame celestial state consumed by the sky, cloud and fog evaluators.

use glam::Vec3;
use skylight_config::CelestialConfig;
use tracing::debug;

use crate::clock::DateTime;
use crate::disc::{DiscParams, eclipse_occlusion, lunar_light_direction, lunar_phase_mask};
use crate::ephemeris::{Ephemeris, GeographicLocation, moon_illumination};
use crate::lighting::{
    ambient_color, moon_altitude_factor, moon_color, moon_intensity, moon_twilight_boost,
    star_visibility, sun_color, sun_intensity, twilight_factor,
};

/// Moonlight scattered into the sky, relative to the scene-lighting moon
/// intensity.
const MOONLIGHT_SKY_SCALE: f32 = 0.1;

/// Session-level controls for the celestial state.
#[derive(Clone, Debug, PartialEq)]
pub struct CelestialSettings {
    pub location: GeographicLocation,
    /// Eclipse fraction in `[0, 1]`; zero when eclipses are disabled.
    pub eclipse_amount: f32,
    pub earthshine: f32,
    pub moon_brightness: f32,
    pub moon_disc_intensity: f32,
    /// Forced synodic phase (0 new, 0.5 full).
    pub moon_phase_override: Option<f32>,
    pub disc: DiscParams,
}

impl Default for CelestialSettings {
    fn default() -> Self {
        Self::from(&CelestialConfig::default())
    }
}

impl From<&CelestialConfig> for CelestialSettings {
    fn from(config: &CelestialConfig) -> Self {
        Self {
            location: GeographicLocation::new(config.latitude_deg, config.longitude_deg),
            eclipse_amount: if config.eclipse_enabled {
                config.eclipse_amount.clamp(0.0, 1.0)
            } else {
                0.0
            },
            earthshine: config.earthshine.clamp(0.0, 1.0),
            moon_brightness: config.moon_brightness.max(0.0),
            moon_disc_intensity: config.moon_disc_intensity.max(0.0),
            moon_phase_override: config.moon_phase_override.map(|p| p.rem_euclid(1.0)),
            disc: DiscParams::default(),
        }
    }
}

/// Sun, moon and night-sky state for one frame.
#[derive(Clone, Debug)]
pub struct CelestialState {
    pub julian_day: f64,
    /// Unit direction towards the sun.
    pub sun_direction: Vec3,
    /// Sun tint in linear RGB.
    pub sun_color: Vec3,
    /// Scene-lighting sun intensity `[0, 1]`, eclipse included.
    pub sun_intensity: f32,
    /// Sunlight still reaching the visible atmosphere `[0, 1]`.
    pub twilight: f32,
    /// Unit direction towards the moon.
    pub moon_direction: Vec3,
    /// Light direction used to shade the lunar disc.
    pub moon_light_direction: Vec3,
    pub moon_color: Vec3,
    /// Scene-lighting moon intensity.
    pub moon_intensity: f32,
    /// Synodic phase: 0 new, 0.5 full.
    pub moon_phase: f32,
    pub moon_illumination: f32,
    /// Moon altitude fade times the post-sunset boost `[0, 1]`.
    pub moon_visibility: f32,
    /// Night factor `[0, 1]`: star field opacity and night-floor weight.
    pub star_visibility: f32,
    pub ambient_color: Vec3,
    pub eclipse_amount: f32,
    /// Fraction of the solar disc hidden by the moon.
    pub eclipse_occlusion: f32,
    pub earthshine: f32,
    pub moon_disc_intensity: f32,
    pub disc: DiscParams,
}

impl CelestialState {
    /// Compute the state for a date, time and observer from the ephemeris.
    pub fn compute(date_time: &DateTime, settings: &CelestialSettings) -> Self {
        let ephemeris = Ephemeris::new(settings.location);
        let julian_day = date_time.julian_day();
        let sun = ephemeris.sun_position_jd(julian_day);
        let moon = ephemeris.moon_position_jd(julian_day);
        debug!(
            julian_day,
            sun_altitude = sun.altitude,
            sun_azimuth = sun.azimuth,
            moon_altitude = moon.altitude,
            moon_phase = moon.phase,
            "celestial ephemeris"
        );
        let phase = settings.moon_phase_override.unwrap_or(moon.phase);
        Self::derive(
            sun.direction,
            moon.direction,
            julian_day,
            Some(phase),
            settings,
        )
    }

    /// Build from explicit directions. The lunar phase follows the sun/moon
    /// geometry unless `settings` overrides it.
    pub fn from_directions(
        sun_direction: Vec3,
        moon_direction: Vec3,
        julian_day: f64,
        settings: &CelestialSettings,
    ) -> Self {
        Self::derive(
            sun_direction,
            moon_direction,
            julian_day,
            settings.moon_phase_override,
            settings,
        )
    }

    fn derive(
        sun_direction: Vec3,
        moon_direction: Vec3,
        julian_day: f64,
        phase: Option<f32>,
        settings: &CelestialSettings,
    ) -> Self {
        let sun = sun_direction.normalize_or(Vec3::Y);
        let moon = moon_direction.normalize_or(-Vec3::Y);

        let (moon_phase, moon_light_direction) = match (phase, settings.moon_phase_override) {
            (_, Some(forced)) => (forced, lunar_light_direction(moon, forced)),
            (Some(phase), None) => (phase, sun),
            (None, None) => {
                let lit = lunar_phase_mask(moon, sun);
                let phase = (1.0 - 2.0 * lit).clamp(-1.0, 1.0).acos() / std::f32::consts::TAU;
                (phase, sun)
            }
        };
        let illumination = moon_illumination(moon_phase);

        let occlusion = eclipse_occlusion(settings.eclipse_amount, &settings.disc);
        let unoccluded = 1.0 - occlusion;

        Self {
            julian_day,
            sun_direction: sun,
            sun_color: sun_color(sun),
            sun_intensity: sun_intensity(sun) * unoccluded,
            twilight: twilight_factor(sun),
            moon_direction: moon,
            moon_light_direction,
            moon_color: moon_color(moon),
            moon_intensity: moon_intensity(moon, illumination) * settings.moon_brightness,
            moon_phase,
            moon_illumination: illumination,
            moon_visibility: moon_altitude_factor(moon) * moon_twilight_boost(sun),
            star_visibility: star_visibility(sun),
            ambient_color: ambient_color(sun),
            eclipse_amount: settings.eclipse_amount,
            eclipse_occlusion: occlusion,
            earthshine: settings.earthshine,
            moon_disc_intensity: settings.moon_disc_intensity,
            disc: settings.disc,
        }
    }

    /// Sunlight entering the atmosphere for the scattering integrals.
    pub fn sun_illuminance(&self, solar_irradiance: Vec3) -> Vec3 {
        solar_irradiance * self.twilight * (1.0 - self.eclipse_occlusion)
    }

    /// Moonlight entering the atmosphere for the scattering integrals.
    pub fn moon_illuminance(&self, solar_irradiance: Vec3) -> Vec3 {
        solar_irradiance
            * self.moon_color
            * (self.moon_intensity * self.moon_visibility * MOONLIGHT_SKY_SCALE)
    }

    /// True once the sun no longer lights the sky.
    pub fn is_night(&self) -> bool {
        self.twilight <= 0.0
    }
}
