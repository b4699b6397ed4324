//! Procedural star field fixed to the celestial sphere.
//!
//! Stars live in a hashed (right ascension, declination) cell grid. The
//! whole sphere turns about the celestial pole by the sidereal angle, so
//! the pattern repeats every sidereal day.

use glam::{Quat, Vec3};
use skylight_math::{hash_to_unit, hash_u32, hash3, smoothstep, tangent_basis};

use crate::clock::J2000;

/// Sidereal rotation rate of the sky.
pub const SIDEREAL_DEGREES_PER_DAY: f64 = 360.9856;

/// Rotation of the sky about the celestial pole at `julian_day`, radians in
/// `[0, 2π)`. Reduced in double precision before narrowing.
pub fn sidereal_angle(julian_day: f64) -> f32 {
    ((julian_day - J2000) * SIDEREAL_DEGREES_PER_DAY)
        .rem_euclid(360.0)
        .to_radians() as f32
}

/// Approximate blackbody colour for a temperature in kelvin (Tanner Helland
/// fit), normalized to a peak channel of 1.
pub fn blackbody_to_rgb(temperature_k: f32) -> Vec3 {
    let t = temperature_k / 100.0;
    let r = if t <= 66.0 {
        1.0
    } else {
        (329.698_73 * (t - 60.0).powf(-0.133_204_76) / 255.0).clamp(0.0, 1.0)
    };
    let g = if t <= 66.0 {
        (99.470_8 * t.ln() - 161.119_57).clamp(0.0, 255.0) / 255.0
    } else {
        (288.122_17 * (t - 60.0).powf(-0.075_514_85) / 255.0).clamp(0.0, 1.0)
    };
    let b = if t >= 66.0 {
        1.0
    } else if t <= 19.0 {
        0.0
    } else {
        (138.517_73 * (t - 10.0).ln() - 305.044_8).clamp(0.0, 255.0) / 255.0
    };
    Vec3::new(r, g, b)
}

/// Hash-based star field.
#[derive(Clone, Debug)]
pub struct StarField {
    /// Probability that an equatorial cell holds a star.
    pub density: f32,
    /// Radiance of the brightest star.
    pub brightness: f32,
    /// Declination bands; right ascension uses twice as many.
    pub bands: u32,
    /// Angular radius of a star glint, radians.
    pub star_radius: f32,
    /// North celestial pole in the observer frame.
    pub pole: Vec3,
    pub seed: u32,
}

impl Default for StarField {
    fn default() -> Self {
        Self::new(0.04, 0.6)
    }
}

impl StarField {
    pub fn new(density: f32, brightness: f32) -> Self {
        Self {
            density: density.clamp(0.0, 1.0),
            brightness: brightness.max(0.0),
            bands: 180,
            star_radius: 0.0025,
            pole: Vec3::Y,
            seed: 0x5eed,
        }
    }

    /// Tilt the pole for an observer at `latitude_deg` (north at +Z).
    pub fn with_latitude(mut self, latitude_deg: f64) -> Self {
        let lat = latitude_deg.clamp(-90.0, 90.0).to_radians() as f32;
        self.pole = Vec3::new(0.0, lat.sin(), lat.cos()).normalize();
        self
    }

    /// Observer-frame direction mapped into the fixed celestial frame.
    pub fn celestial_direction(&self, dir: Vec3, julian_day: f64) -> Vec3 {
        Quat::from_axis_angle(self.pole, -sidereal_angle(julian_day)) * dir
    }

    /// Star radiance in the celestial frame, without horizon or day gating.
    pub fn sample_celestial(&self, celestial_dir: Vec3) -> Vec3 {
        let (e1, e2) = tangent_basis(self.pole);
        let d = celestial_dir.normalize_or_zero();
        let declination = d.dot(self.pole).clamp(-1.0, 1.0).asin();
        let right_ascension = d.dot(e1).atan2(d.dot(e2));

        let bands = self.bands.max(2) as i32;
        let sectors = bands * 2;
        let band_size = std::f32::consts::PI / bands as f32;
        let sector_size = std::f32::consts::TAU / sectors as f32;

        let cy = ((declination + std::f32::consts::FRAC_PI_2) / band_size).floor() as i32;
        let cx = ((right_ascension + std::f32::consts::PI) / sector_size).floor() as i32;

        let mut radiance = Vec3::ZERO;
        for dy in -1..=1 {
            let y = cy + dy;
            if y < 0 || y >= bands {
                continue;
            }
            let band_center = (y as f32 + 0.5) * band_size - std::f32::consts::FRAC_PI_2;
            // Equal-area acceptance: cells shrink towards the poles.
            let acceptance = self.density * band_center.cos();
            for dx in -1..=1 {
                let x = (cx + dx).rem_euclid(sectors);
                let h = hash3(x, y, self.seed as i32);
                if hash_to_unit(h) >= acceptance {
                    continue;
                }
                let jitter_ra = 0.2 + 0.6 * hash_to_unit(hash_u32(h ^ 0x1));
                let jitter_dec = 0.2 + 0.6 * hash_to_unit(hash_u32(h ^ 0x2));
                let star_ra = (x as f32 + jitter_ra) * sector_size - std::f32::consts::PI;
                let star_dec = (y as f32 + jitter_dec) * band_size - std::f32::consts::FRAC_PI_2;
                let star_dir = self.pole * star_dec.sin()
                    + (e1 * star_ra.sin() + e2 * star_ra.cos()) * star_dec.cos();

                let angle = d.cross(star_dir).length().atan2(d.dot(star_dir));
                let falloff = 1.0 - smoothstep(0.0, self.star_radius, angle);
                if falloff <= 0.0 {
                    continue;
                }
                // Most stars are faint.
                let magnitude = hash_to_unit(hash_u32(h ^ 0x3)).powi(6);
                let temperature = 3000.0 + 9000.0 * hash_to_unit(hash_u32(h ^ 0x4));
                radiance += blackbody_to_rgb(temperature) * magnitude * falloff;
            }
        }
        radiance * self.brightness
    }

    /// Star radiance seen along `dir` at `julian_day`, scaled by the night
    /// factor and faded out at the horizon.
    pub fn radiance(&self, dir: Vec3, julian_day: f64, visibility: f32) -> Vec3 {
        if visibility <= 0.0 || dir.y <= 0.0 {
            return Vec3::ZERO;
        }
        let horizon_fade = smoothstep(0.0, 0.05, dir.y);
        self.sample_celestial(self.celestial_direction(dir, julian_day))
            * visibility
            * horizon_fade
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_upper_dirs(count: usize, seed: u64) -> Vec<Vec3> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                Vec3::new(
                    rng.random_range(-1.0..1.0),
                    rng.random_range(0.1..1.0),
                    rng.random_range(-1.0..1.0),
                )
                .normalize()
            })
            .collect()
    }

    /// Directions sitting exactly on star centres, so comparisons are not
    /// all trivially zero.
    fn star_centres(field: &StarField, count: usize) -> Vec<Vec3> {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut found = Vec::new();
        while found.len() < count {
            let dir = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(0.2..1.0),
                rng.random_range(-1.0..1.0),
            )
            .normalize();
            if field.sample_celestial(dir).length() > 0.0 {
                found.push(dir);
            }
        }
        found
    }

    #[test]
    fn test_sidereal_angle_at_epoch() {
        assert_eq!(sidereal_angle(J2000), 0.0);
        let one_day = sidereal_angle(J2000 + 1.0).to_degrees();
        assert!((one_day - 0.9856).abs() < 1e-3, "one day advances {one_day} deg");
    }

    #[test]
    fn test_pattern_repeats_after_sidereal_day() {
        let field = StarField::new(0.5, 1.0);
        let sidereal_day = 360.0 / SIDEREAL_DEGREES_PER_DAY;
        let jd = 2460483.25;
        let mut dirs = random_upper_dirs(500, 3);
        dirs.extend(star_centres(&field, 20));
        for dir in dirs {
            let a = field.radiance(dir, jd, 1.0);
            let b = field.radiance(dir, jd + sidereal_day, 1.0);
            assert!(
                (a - b).length() < 1e-3 * (1.0 + a.length()),
                "star pattern changed at {dir:?}: {a:?} vs {b:?}"
            );
        }
    }

    #[test]
    fn test_pattern_rotates_with_sidereal_angle() {
        let field = StarField::new(0.5, 1.0);
        let jd = 2460483.25;
        let delta_days = 0.1;
        let rotation = Quat::from_axis_angle(
            field.pole,
            (delta_days * SIDEREAL_DEGREES_PER_DAY).to_radians() as f32,
        );
        let mut checked_non_zero = 0;
        for dir in star_centres(&field, 20) {
            let celestial = field.sample_celestial(dir);
            // Find where that celestial direction appears now and later.
            let now = Quat::from_axis_angle(field.pole, sidereal_angle(jd)) * dir;
            let later = rotation * now;
            let a = field.sample_celestial(field.celestial_direction(now, jd));
            let b = field.sample_celestial(field.celestial_direction(later, jd + delta_days));
            assert!((a - celestial).length() < 1e-3 * (1.0 + celestial.length()));
            assert!((a - b).length() < 1e-3 * (1.0 + a.length()));
            if a.length() > 0.0 {
                checked_non_zero += 1;
            }
        }
        assert!(checked_non_zero > 0);
    }

    #[test]
    fn test_stars_hidden_by_day_and_below_horizon() {
        let field = StarField::new(1.0, 1.0);
        let dirs = star_centres(&field, 5);
        for dir in dirs {
            assert_eq!(field.radiance(dir, J2000, 0.0), Vec3::ZERO);
        }
        assert_eq!(field.radiance(-Vec3::Y, J2000, 1.0), Vec3::ZERO);
    }

    #[test]
    fn test_density_zero_has_no_stars() {
        let field = StarField::new(0.0, 1.0);
        for dir in random_upper_dirs(200, 11) {
            assert_eq!(field.sample_celestial(dir), Vec3::ZERO);
        }
    }

    #[test]
    fn test_star_radiance_non_negative_and_bounded() {
        let field = StarField::new(0.3, 2.0);
        for dir in random_upper_dirs(1000, 5) {
            let r = field.radiance(dir, 2451600.0, 1.0);
            assert!(r.min_element() >= 0.0);
            // Neighbour cells can overlap by at most a few glints.
            assert!(r.max_element() <= 2.0 * 9.0);
        }
    }

    #[test]
    fn test_latitude_tilts_pole() {
        let field = StarField::default().with_latitude(51.5);
        assert!((field.pole.y - 51.5_f32.to_radians().sin()).abs() < 1e-5);
        assert!(field.pole.z > 0.0);
    }

    #[test]
    fn test_blackbody_red_at_low_temperature() {
        let c = blackbody_to_rgb(3000.0);
        assert!(c.x > c.z, "cool stars are red: {c:?}");
    }

    #[test]
    fn test_blackbody_blue_at_high_temperature() {
        let c = blackbody_to_rgb(12000.0);
        assert!(c.z >= c.x, "hot stars are blue: {c:?}");
    }
}
