//! Lighting curves driven by sun and moon elevation.
//!
//! Inputs are unit directions (Y up); elevation thresholds are in degrees.

use glam::Vec3;
use skylight_math::smoothstep;

fn elevation_degrees(direction: Vec3) -> f32 {
    direction.y.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Scene-lighting sun intensity in `[0, 1]`: zero below civil twilight
/// (−6°), full above +10°.
pub fn sun_intensity(sun_direction: Vec3) -> f32 {
    smoothstep(-6.0, 10.0, elevation_degrees(sun_direction))
}

/// How much sunlight still reaches the visible atmosphere, `[0, 1]`.
///
/// The scattering integral already handles the planet shadow; this fades
/// the residual glow out between −10° and the horizon so deep night is
/// lit by the moon and stars only.
pub fn twilight_factor(sun_direction: Vec3) -> f32 {
    smoothstep(-10.0, 0.0, elevation_degrees(sun_direction))
}

/// Sun colour: orange-red at the horizon to warm white high up.
pub fn sun_color(sun_direction: Vec3) -> Vec3 {
    let t = smoothstep(-5.0, 30.0, elevation_degrees(sun_direction));
    Vec3::new(1.0, 0.4, 0.2).lerp(Vec3::new(1.0, 0.98, 0.95), t)
}

/// Moonlight colour: cool blue-white, warmer near the horizon.
pub fn moon_color(moon_direction: Vec3) -> Vec3 {
    let t = smoothstep(-5.0, 30.0, elevation_degrees(moon_direction));
    Vec3::new(0.6, 0.6, 0.7).lerp(Vec3::new(0.7, 0.75, 0.9), t)
}

/// Ambient colour from night floor to daytime ambient.
pub fn ambient_color(sun_direction: Vec3) -> Vec3 {
    let t = smoothstep(-10.0, 10.0, elevation_degrees(sun_direction));
    Vec3::new(0.05, 0.05, 0.08).lerp(Vec3::new(0.15, 0.15, 0.20), t)
}

/// Moonlight only matters once the sun has set: 0 above +10°, 1 below −6°.
pub fn moon_twilight_boost(sun_direction: Vec3) -> f32 {
    smoothstep(10.0, -6.0, elevation_degrees(sun_direction))
}

/// Opacity of the star field (the night factor). Stars are fully visible at
/// night and gone once the sun reaches half intensity.
pub fn star_visibility(sun_direction: Vec3) -> f32 {
    (1.0 - sun_intensity(sun_direction) * 2.0).clamp(0.0, 1.0)
}

/// Scene-lighting moon intensity: altitude fade times illumination, with a
/// small floor so nights are never pitch black.
pub(crate) fn moon_intensity(moon_direction: Vec3, illumination: f32) -> f32 {
    let base = moon_altitude_factor(moon_direction) * illumination * 0.12;
    base.max(illumination * 0.02)
}

/// Visibility of the moon above the horizon, `[0, 1]`.
pub(crate) fn moon_altitude_factor(moon_direction: Vec3) -> f32 {
    ((elevation_degrees(moon_direction) + 2.0) / 12.0).clamp(0.0, 1.0)
}
