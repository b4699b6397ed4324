//! Celestial bodies for the sky: sun and moon positions, lighting curves,
//! disc rendering (lunar phase, solar eclipse, corona) and the sidereal
//! star field.

mod clock;
mod disc;
mod ephemeris;
mod lighting;
mod stars;
mod state;

pub use clock::{DateTime, DayNightClock, J2000, julian_day};
pub use disc::{
    DiscParams, MoonDiscSample, SolarDiscSample, corona_intensity, eclipse_moon_direction,
    eclipse_occlusion, lunar_light_direction, lunar_phase_mask, moon_disc, solar_disc, sun_disc,
};
pub use ephemeris::{
    Ephemeris, GeographicLocation, MoonPosition, SYNODIC_MONTH, SunPosition, alt_az_to_direction,
    moon_illumination,
};
pub use lighting::{
    ambient_color, moon_color, moon_twilight_boost, star_visibility, sun_color, sun_intensity,
    twilight_factor,
};
pub use stars::{SIDEREAL_DEGREES_PER_DAY, StarField, blackbody_to_rgb, sidereal_angle};
pub use state::{CelestialSettings, CelestialState};
