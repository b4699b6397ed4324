//! Per-frame sky-view table: in-scattered radiance for every view direction
//! around the camera.
//!
//! `u` maps world azimuth linearly over `[-π, π)` (measured from +Z towards
//! +X). `v` maps elevation non-linearly, `elevation = sign(v')·(π/2)·v'²`
//! with `v' = 2v − 1`, so texels crowd around the horizon where the sky
//! changes fastest. RGB holds radiance and A the luminance of the view
//! transmittance.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Vec2, Vec3, Vec4};
use skylight_celestial::CelestialState;
use skylight_math::{direction_from_angles, luminance};
use tracing::debug;

use crate::integrate::{LightSource, ScatteringTables, integrate_scattering};
use crate::lut::{Lut2D, texel_center};
use crate::model::AtmosphereModel;
use crate::params::AtmosphereParams;

pub const SKY_VIEW_WIDTH: u32 = 192;
pub const SKY_VIEW_HEIGHT: u32 = 108;
pub const SKY_VIEW_STEPS: u32 = 30;

/// Texture coordinate of a view direction.
pub fn encode_direction(dir: Vec3) -> Vec2 {
    let d = dir.normalize_or(Vec3::Y);
    let elevation = d.y.clamp(-1.0, 1.0).asin();
    let v = (elevation.abs() / FRAC_PI_2).sqrt().copysign(elevation);
    let azimuth = d.x.atan2(d.z);
    Vec2::new(azimuth / TAU + 0.5, 0.5 + 0.5 * v)
}

/// View direction of a texture coordinate.
pub fn decode_direction(uv: Vec2) -> Vec3 {
    let v = uv.y * 2.0 - 1.0;
    let elevation = v * v.abs() * FRAC_PI_2;
    let azimuth = (uv.x - 0.5) * TAU;
    direction_from_angles(elevation, azimuth)
}

/// Sky radiance around one camera position.
#[derive(Clone, Debug)]
pub struct SkyViewLut {
    lut: Lut2D<Vec4>,
    camera_altitude: f32,
    lights: Vec<LightSource>,
}

impl SkyViewLut {
    pub fn build(
        params: &AtmosphereParams,
        tables: ScatteringTables<'_>,
        camera_altitude_km: f32,
        lights: &[LightSource],
        threads: usize,
    ) -> Self {
        Self::build_sized(
            params,
            tables,
            camera_altitude_km,
            lights,
            SKY_VIEW_WIDTH,
            SKY_VIEW_HEIGHT,
            threads,
        )
    }

    pub fn build_sized(
        params: &AtmosphereParams,
        tables: ScatteringTables<'_>,
        camera_altitude_km: f32,
        lights: &[LightSource],
        width: u32,
        height: u32,
        threads: usize,
    ) -> Self {
        let origin = params.camera_position(camera_altitude_km);
        let lut = Lut2D::build(width, height, threads, |x, y| {
            let dir = decode_direction(texel_center(x, y, width, height));
            let result =
                integrate_scattering(params, tables, origin, dir, f32::MAX, lights, SKY_VIEW_STEPS);
            result.inscatter.extend(luminance(result.transmittance))
        });
        debug!(width, height, camera_altitude_km, "sky-view LUT built");
        Self {
            lut,
            camera_altitude: camera_altitude_km,
            lights: lights.to_vec(),
        }
    }

    pub fn lut(&self) -> &Lut2D<Vec4> {
        &self.lut
    }

    pub fn camera_altitude(&self) -> f32 {
        self.camera_altitude
    }

    /// Radiance (RGB) and transmittance luminance (A) towards `dir`.
    pub fn sample(&self, dir: Vec3) -> Vec4 {
        self.lut.sample(encode_direction(dir))
    }

    /// Whether the camera or the lights moved past the thresholds since this
    /// table was built.
    pub fn is_stale(
        &self,
        camera_altitude_km: f32,
        lights: &[LightSource],
        direction_threshold: f32,
        altitude_threshold_km: f32,
    ) -> bool {
        if (camera_altitude_km - self.camera_altitude).abs() > altitude_threshold_km {
            return true;
        }
        if lights.len() != self.lights.len() {
            return true;
        }
        self.lights.iter().zip(lights).any(|(built, now)| {
            let turned = 1.0 - built.direction.dot(now.direction) > direction_threshold;
            let scale = built.illuminance.max_element().max(now.illuminance.max_element());
            let dimmed = (built.illuminance - now.illuminance).abs().max_element()
                > direction_threshold.max(1e-3) * scale.max(1e-6);
            turned || dimmed
        })
    }
}

/// Keeps the last sky-view table and rebuilds it only when the camera or
/// the lights moved far enough to matter.
#[derive(Debug)]
pub struct SkyViewCache {
    direction_threshold: f32,
    altitude_threshold_km: f32,
    current: Option<SkyViewLut>,
    rebuilds: u32,
}

impl SkyViewCache {
    pub fn new(direction_threshold: f32, altitude_threshold_km: f32) -> Self {
        Self {
            direction_threshold: direction_threshold.max(0.0),
            altitude_threshold_km: altitude_threshold_km.max(0.0),
            current: None,
            rebuilds: 0,
        }
    }

    /// Number of tables built so far.
    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }

    /// Drop the cached table so the next update rebuilds it.
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    /// Current table for this camera altitude and celestial state.
    pub fn update(
        &mut self,
        model: &AtmosphereModel,
        camera_altitude_km: f32,
        celestial: &CelestialState,
    ) -> &SkyViewLut {
        let lights = model.lights(celestial);
        let lut = match self.current.take() {
            Some(lut)
                if !lut.is_stale(
                    camera_altitude_km,
                    &lights,
                    self.direction_threshold,
                    self.altitude_threshold_km,
                ) =>
            {
                lut
            }
            _ => {
                self.rebuilds += 1;
                debug!(rebuilds = self.rebuilds, "rebuilding sky-view LUT");
                model.build_sky_view_with(camera_altitude_km, &lights)
            }
        };
        self.current.insert(lut)
    }
}
