//! Low-precision solar and lunar ephemeris.
//!
//! Positions come from the mean-element series in Meeus' *Astronomical
//! Algorithms*; good to a fraction of a degree, which is all a sky renderer
//! needs. Horizontal coordinates use azimuth 0 = north, 90 = east.

use glam::Vec3;
use skylight_math::direction_from_angles;

use crate::clock::{DateTime, J2000};

/// Mean synodic month (new moon to new moon) in days.
pub const SYNODIC_MONTH: f64 = 29.530588853;

/// Julian day of a reference new moon (2000-01-06 18:14 UTC).
const NEW_MOON_REFERENCE: f64 = 2451550.1;

/// Observer position on the planet surface, degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeographicLocation {
    pub latitude: f64,
    /// East positive.
    pub longitude: f64,
}

impl GeographicLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: latitude.clamp(-90.0, 90.0),
            longitude,
        }
    }

    pub fn london() -> Self {
        Self::new(51.5074, -0.1278)
    }

    pub fn new_york() -> Self {
        Self::new(40.7128, -74.0060)
    }

    pub fn tokyo() -> Self {
        Self::new(35.6762, 139.6503)
    }

    pub fn sydney() -> Self {
        Self::new(-33.8688, 151.2093)
    }
}

impl Default for GeographicLocation {
    fn default() -> Self {
        Self::london()
    }
}

/// Sun position in the observer's sky.
#[derive(Clone, Copy, Debug)]
pub struct SunPosition {
    /// Degrees above the horizon.
    pub altitude: f32,
    /// Degrees clockwise from north.
    pub azimuth: f32,
    /// Unit direction towards the sun (Y up, Z north, X east).
    pub direction: Vec3,
}

/// Moon position and phase.
#[derive(Clone, Copy, Debug)]
pub struct MoonPosition {
    pub altitude: f32,
    pub azimuth: f32,
    pub direction: Vec3,
    /// Fraction of the synodic month: 0 new, 0.5 full.
    pub phase: f32,
    /// Illuminated fraction of the disc.
    pub illumination: f32,
}

/// Unit direction for a horizontal position given in degrees.
pub fn alt_az_to_direction(altitude_deg: f32, azimuth_deg: f32) -> Vec3 {
    direction_from_angles(altitude_deg.to_radians(), azimuth_deg.to_radians())
}

/// Illuminated fraction for a synodic phase (0 new, 0.5 full).
pub fn moon_illumination(phase: f32) -> f32 {
    (1.0 - (phase * std::f32::consts::TAU).cos()) * 0.5
}

fn normalize_degrees(angle: f64) -> f64 {
    angle.rem_euclid(360.0)
}

fn normalize_degrees_signed(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Equatorial coordinates in degrees.
#[derive(Clone, Copy, Debug)]
struct Equatorial {
    right_ascension: f64,
    declination: f64,
}

/// Ephemeris for a fixed observer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ephemeris {
    pub location: GeographicLocation,
}

impl Ephemeris {
    pub fn new(location: GeographicLocation) -> Self {
        Self { location }
    }

    /// Local mean sidereal time in degrees.
    pub fn local_sidereal_time(&self, julian_day: f64) -> f64 {
        let d = julian_day - J2000;
        let gmst = normalize_degrees(280.46061837 + 360.98564736629 * d);
        normalize_degrees(gmst + self.location.longitude)
    }

    fn obliquity(julian_day: f64) -> f64 {
        (23.439 - 0.0000004 * (julian_day - J2000)).to_radians()
    }

    fn solar_equatorial(julian_day: f64) -> Equatorial {
        let n = julian_day - J2000;
        let mean_longitude = normalize_degrees(280.460 + 0.9856474 * n);
        let mean_anomaly = normalize_degrees(357.528 + 0.9856003 * n).to_radians();
        let ecliptic_longitude = (mean_longitude
            + 1.915 * mean_anomaly.sin()
            + 0.020 * (2.0 * mean_anomaly).sin())
        .to_radians();
        let epsilon = Self::obliquity(julian_day);

        let right_ascension = normalize_degrees(
            (epsilon.cos() * ecliptic_longitude.sin())
                .atan2(ecliptic_longitude.cos())
                .to_degrees(),
        );
        let declination = (epsilon.sin() * ecliptic_longitude.sin())
            .asin()
            .to_degrees();
        Equatorial {
            right_ascension,
            declination,
        }
    }

    fn lunar_equatorial(julian_day: f64) -> Equatorial {
        let t = (julian_day - J2000) / 36525.0;
        let l0 = normalize_degrees(218.3164477 + 481267.88123421 * t);
        let m = normalize_degrees(134.9633964 + 477198.8675055 * t).to_radians();
        let f = normalize_degrees(93.2720950 + 483202.0175233 * t).to_radians();
        let ms = normalize_degrees(357.5291092 + 35999.0502909 * t).to_radians();
        let d = normalize_degrees(297.8501921 + 445267.1114034 * t).to_radians();

        let longitude = normalize_degrees(
            l0 + 6.289 * m.sin() - 1.274 * (2.0 * d - m).sin() + 0.658 * (2.0 * d).sin()
                - 0.214 * (2.0 * m).sin()
                - 0.186 * ms.sin(),
        )
        .to_radians();
        let latitude =
            (5.128 * f.sin() + 0.281 * (m + f).sin() - 0.278 * (f - m).sin()).to_radians();

        let epsilon = Self::obliquity(julian_day);
        let right_ascension = normalize_degrees(
            (longitude.sin() * epsilon.cos() - latitude.tan() * epsilon.sin())
                .atan2(longitude.cos())
                .to_degrees(),
        );
        let declination = (latitude.sin() * epsilon.cos()
            + latitude.cos() * epsilon.sin() * longitude.sin())
        .asin()
        .to_degrees();
        Equatorial {
            right_ascension,
            declination,
        }
    }

    /// Convert equatorial to (altitude, azimuth) in degrees.
    fn to_horizontal(&self, eq: Equatorial, julian_day: f64) -> (f64, f64) {
        let hour_angle = normalize_degrees_signed(
            self.local_sidereal_time(julian_day) - eq.right_ascension,
        )
        .to_radians();
        let dec = eq.declination.to_radians();
        let lat = self.location.latitude.to_radians();

        let sin_alt = dec.sin() * lat.sin() + dec.cos() * lat.cos() * hour_angle.cos();
        let altitude = sin_alt.clamp(-1.0, 1.0).asin();

        let denom = lat.cos() * altitude.cos();
        let cos_az = if denom.abs() < 1e-12 {
            1.0
        } else {
            ((dec.sin() - lat.sin() * sin_alt) / denom).clamp(-1.0, 1.0)
        };
        let mut azimuth = cos_az.acos().to_degrees();
        if hour_angle.sin() > 0.0 {
            azimuth = 360.0 - azimuth;
        }
        (altitude.to_degrees(), azimuth)
    }

    pub fn sun_position(&self, date_time: &DateTime) -> SunPosition {
        self.sun_position_jd(date_time.julian_day())
    }

    pub fn sun_position_jd(&self, julian_day: f64) -> SunPosition {
        let (altitude, azimuth) = self.to_horizontal(Self::solar_equatorial(julian_day), julian_day);
        let (altitude, azimuth) = (altitude as f32, azimuth as f32);
        SunPosition {
            altitude,
            azimuth,
            direction: alt_az_to_direction(altitude, azimuth),
        }
    }

    pub fn moon_position(&self, date_time: &DateTime) -> MoonPosition {
        self.moon_position_jd(date_time.julian_day())
    }

    pub fn moon_position_jd(&self, julian_day: f64) -> MoonPosition {
        let (altitude, azimuth) =
            self.to_horizontal(Self::lunar_equatorial(julian_day), julian_day);
        let (altitude, azimuth) = (altitude as f32, azimuth as f32);
        let phase = Self::moon_phase(julian_day);
        MoonPosition {
            altitude,
            azimuth,
            direction: alt_az_to_direction(altitude, azimuth),
            phase,
            illumination: moon_illumination(phase),
        }
    }

    /// Synodic phase in `[0, 1)`: 0 new, 0.5 full.
    pub fn moon_phase(julian_day: f64) -> f32 {
        ((julian_day - NEW_MOON_REFERENCE).rem_euclid(SYNODIC_MONTH) / SYNODIC_MONTH) as f32
    }
}
