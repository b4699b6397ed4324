//! Offline renderer: frames of sky, clouds and a flat ground plane.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::path::{Path, PathBuf};
use std::time::Instant;

use glam::{Vec3, Vec4};
use skylight_atmosphere::{
    AerialPerspective, AtmosphereModel, AtmosphereParams, ExportError, LightSource, SkyRenderer,
    SkySettings, SkyViewCache, SkyViewLut, export_sky_view, export_static_luts, fill_rows,
    worker_count, write_lut_png,
};
use skylight_celestial::{CelestialSettings, CelestialState, DateTime, DayNightClock};
use skylight_clouds::{CloudLayer, CloudMap, CloudNoise, CloudRenderer};
use skylight_config::{CelestialConfig, CloudStyle, Config, FogConfig, Projection};
use skylight_math::{direction_from_angles, safe_exp_vec3, saturate};
use tracing::{debug, info};

use crate::error::AppError;

/// Ground hits further than this are shaded at this distance.
pub const MAX_GROUND_DISTANCE_M: f32 = 50_000.0;

/// View direction through the centre of pixel `(x, y)`, or `None` outside a
/// fisheye circle.
///
/// Equirectangular images put north (+Z) in the middle column and the
/// zenith on the top row. Fisheye images are equidistant with the zenith in
/// the centre and north up.
pub fn pixel_direction(
    projection: Projection,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Option<Vec3> {
    let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
    match projection {
        Projection::Equirectangular => {
            let azimuth = (fx / width as f32 - 0.5) * TAU;
            let elevation = (0.5 - fy / height as f32) * PI;
            Some(direction_from_angles(elevation, azimuth))
        }
        Projection::Fisheye => {
            let half = width.min(height) as f32 * 0.5;
            let px = (fx - width as f32 * 0.5) / half;
            let py = (fy - height as f32 * 0.5) / half;
            let r = (px * px + py * py).sqrt();
            if r > 1.0 {
                return None;
            }
            Some(direction_from_angles(FRAC_PI_2 * (1.0 - r), px.atan2(-py)))
        }
    }
}

/// Exponential tone curve.
pub fn tone_map(radiance: Vec3, exposure: f32) -> Vec3 {
    Vec3::ONE - safe_exp_vec3(-radiance.max(Vec3::ZERO) * exposure)
}

pub fn linear_to_srgb(x: f32) -> f32 {
    let x = saturate(x);
    if x <= 0.003_130_8 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

/// Linear HDR image; alpha is zero outside the projection.
#[derive(Clone, Debug)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec4>,
}

impl Image {
    /// Tone-mapped sRGB bytes.
    pub fn to_rgba8(&self, exposure: f32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            let mapped = tone_map(pixel.truncate(), exposure);
            for c in [mapped.x, mapped.y, mapped.z] {
                bytes.push((linear_to_srgb(c) * 255.0 + 0.5) as u8);
            }
            bytes.push((saturate(pixel.w) * 255.0 + 0.5) as u8);
        }
        bytes
    }
}

/// State shared by every frame of a run: the static tables, the sky-view
/// cache and the day/night clock.
pub struct Renderer {
    model: AtmosphereModel,
    sky_views: SkyViewCache,
    clock: DayNightClock,
    days_elapsed: u32,
    calendar: CelestialConfig,
    celestial_settings: CelestialSettings,
    sky_settings: SkySettings,
    layer: CloudLayer,
    noise: CloudNoise,
    camera_altitude_m: f32,
    threads: usize,
}

impl Renderer {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let threads = config.render.threads;
        let model = AtmosphereModel::new(AtmosphereParams::from(&config.atmosphere), threads)?;
        let sky = &config.celestial;
        let layer = CloudLayer::from_config(&config.clouds, model.params().planet_radius);
        let noise = CloudNoise::new(layer.seed, layer.detail_scale);
        Ok(Self {
            sky_views: SkyViewCache::new(
                config.sky.sky_view_direction_threshold,
                config.sky.sky_view_altitude_threshold_km,
            ),
            clock: DayNightClock::at_hour(sky.hour, sky.day_duration_seconds),
            days_elapsed: 0,
            calendar: sky.clone(),
            celestial_settings: CelestialSettings::from(sky),
            sky_settings: SkySettings::from_config(&config.sky, sky.latitude_deg),
            layer,
            noise,
            camera_altitude_m: config.render.camera_altitude_m.max(0.0),
            threads,
            model,
        })
    }

    /// Hours since local midnight of the configured date.
    pub fn local_hour(&self) -> f64 {
        f64::from(self.days_elapsed) * 24.0 + self.clock.hours()
    }

    /// Run the day/night clock for `dt_s` real-time seconds.
    pub fn advance(&mut self, dt_s: f64) {
        self.days_elapsed += self.clock.tick(dt_s);
        debug!(local_hour = self.local_hour(), "clock advanced");
    }

    /// Sky-view tables built so far.
    pub fn sky_view_rebuilds(&self) -> u32 {
        self.sky_views.rebuilds()
    }

    /// Celestial state, sky view and cloud map for the current clock time.
    /// The sky-view table is reused while sun and moon have barely moved.
    pub fn frame(&mut self) -> Frame<'_> {
        let start = Instant::now();
        let local_hour = self.local_hour();
        let sky = &self.calendar;
        let date_time = DateTime::from_local(
            sky.year,
            sky.month,
            sky.day,
            local_hour,
            sky.timezone_offset_hours,
        );
        let celestial = CelestialState::compute(&date_time, &self.celestial_settings);

        let time_s = (local_hour * 3600.0) as f32;
        let layer = &self.layer;
        let cloud_map = (layer.enabled && layer.style == CloudStyle::Paraboloid).then(|| {
            CloudMap::build(
                layer,
                &self.noise,
                self.model.params().planet_radius,
                layer.wind_offset(time_s),
                self.threads,
            )
        });
        let sky_view =
            self.sky_views
                .update(&self.model, self.camera_altitude_m * 1e-3, &celestial);

        info!(
            julian_day = celestial.julian_day,
            sun_elevation_deg = celestial.sun_direction.y.asin().to_degrees(),
            moon_phase = celestial.moon_phase,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "frame prepared"
        );
        Frame {
            model: &self.model,
            celestial,
            sky_view,
            sky_settings: &self.sky_settings,
            layer,
            noise: &self.noise,
            cloud_map,
            time_s,
            camera_altitude_m: self.camera_altitude_m,
        }
    }
}

/// Everything a frame needs before any pixel is shaded.
#[derive(Debug)]
pub struct Frame<'a> {
    pub model: &'a AtmosphereModel,
    pub celestial: CelestialState,
    pub sky_view: &'a SkyViewLut,
    pub sky_settings: &'a SkySettings,
    pub layer: &'a CloudLayer,
    pub noise: &'a CloudNoise,
    pub cloud_map: Option<CloudMap>,
    /// Animation time driving the wind, seconds.
    pub time_s: f32,
    pub camera_altitude_m: f32,
}

impl Frame<'_> {
    /// Write every table of this frame as PNG into `dir`.
    pub fn export_luts(&self, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = export_static_luts(self.model, dir)?;
        written.push(export_sky_view(self.sky_view, dir)?);
        if let Some(map) = &self.cloud_map {
            let path = dir.join("cloud_map.png");
            write_lut_png(map.lut(), &path, 1.0)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Output path of frame `index`. Sequences get a zero-padded index appended
/// to the file stem.
pub fn frame_path(output: &Path, index: u32, frames: u32) -> PathBuf {
    if frames <= 1 {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let name = match output.extension() {
        Some(ext) => format!("{stem}_{index:04}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index:04}"),
    };
    output.with_file_name(name)
}

/// Per-pixel shading for one prepared frame.
pub struct Scene<'a> {
    frame: &'a Frame<'a>,
    sky: SkyRenderer<'a>,
    clouds: CloudRenderer<'a>,
    aerial: AerialPerspective<'a>,
    /// Camera in scene metres (ground at y = 0).
    camera_scene: Vec3,
    /// Camera in planet-centred kilometres.
    camera_planet: Vec3,
}

impl<'a> Scene<'a> {
    pub fn new(frame: &'a Frame<'a>, fog: &FogConfig) -> Self {
        let camera_scene = Vec3::new(0.0, frame.camera_altitude_m, 0.0);
        let aerial = AerialPerspective::new(
            frame.model,
            &frame.celestial,
            fog,
            frame.sky_settings.night_floor,
        );
        Self {
            frame,
            sky: SkyRenderer::new(
                frame.model,
                frame.sky_view,
                &frame.celestial,
                frame.sky_settings,
            ),
            clouds: CloudRenderer::new(
                frame.model,
                frame.layer,
                frame.noise,
                frame.cloud_map.as_ref(),
                &frame.celestial,
                frame.time_s,
            ),
            camera_planet: aerial.to_planet(camera_scene),
            aerial,
            camera_scene,
        }
    }

    /// Radiance seen along `dir`. `seed` decorrelates the cloud jitter.
    pub fn shade(&self, dir: Vec3, seed: u32) -> Vec3 {
        if dir.y >= 0.0 {
            self.clouds
                .march(self.camera_planet, dir, seed)
                .over(self.sky.radiance(dir))
        } else {
            self.ground(dir)
        }
    }

    fn ground(&self, dir: Vec3) -> Vec3 {
        let distance = (self.camera_scene.y / -dir.y).min(MAX_GROUND_DISTANCE_M);
        let mut fragment = self.camera_scene + dir * distance;
        fragment.y = fragment.y.max(0.0);

        let celestial = &self.frame.celestial;
        let model = self.frame.model;
        let position = self.aerial.to_planet(fragment);
        let normal = position.normalize_or(Vec3::Y);
        let sun_visibility = self
            .clouds
            .shadow_transmittance(position, celestial.sun_direction);

        let albedo = model.params().ground_albedo;
        let [sun, moon] = model.lights(celestial);
        let direct = |light: &LightSource| {
            light.illuminance
                * model.light_transmittance(position, light.direction)
                * (light.direction.dot(normal).max(0.0) / PI)
        };
        let lit = (direct(&sun) * sun_visibility
            + direct(&moon)
            + model.ambient_radiance(position, celestial))
            * albedo;
        self.aerial
            .apply(lit, self.camera_scene, fragment, sun_visibility)
    }
}

/// Shade every pixel on `threads` workers (0 = one per core).
pub fn render(
    scene: &Scene<'_>,
    projection: Projection,
    width: u32,
    height: u32,
    threads: usize,
) -> Image {
    let start = Instant::now();
    let width = width.max(1);
    let height = height.max(1);
    let mut pixels = vec![Vec4::ZERO; (width * height) as usize];
    fill_rows(
        &mut pixels,
        width as usize,
        worker_count(threads),
        |x, y| match pixel_direction(projection, x as u32, y as u32, width, height) {
            Some(dir) => scene.shade(dir, (y * width as usize + x) as u32).extend(1.0),
            None => Vec4::ZERO,
        },
    );
    info!(
        width,
        height,
        ?projection,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "rendered frame"
    );
    Image {
        width,
        height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skylight_config::SkyConfig;

    fn small_config(hour: f64) -> Config {
        let mut config = Config::default();
        config.celestial.hour = hour;
        config.render.width = 24;
        config.render.height = 12;
        config.render.threads = 2;
        config
    }

    #[test]
    fn test_equirect_layout() {
        let centre = pixel_direction(Projection::Equirectangular, 50, 25, 100, 50).unwrap();
        assert!(centre.z > 0.99 && centre.y.abs() < 0.05, "{centre:?}");
        let top = pixel_direction(Projection::Equirectangular, 10, 0, 100, 50).unwrap();
        assert!(top.y > 0.99);
        let bottom = pixel_direction(Projection::Equirectangular, 10, 49, 100, 50).unwrap();
        assert!(bottom.y < -0.99);
    }

    #[test]
    fn test_fisheye_layout() {
        let zenith = pixel_direction(Projection::Fisheye, 50, 50, 101, 101).unwrap();
        assert!(zenith.y > 0.999);
        assert!(pixel_direction(Projection::Fisheye, 0, 0, 101, 101).is_none());
        let north = pixel_direction(Projection::Fisheye, 50, 0, 101, 101).unwrap();
        assert!(north.z > 0.99 && north.y < 0.05, "{north:?}");
    }

    #[test]
    fn test_tone_map_bounded_and_monotone() {
        let mut previous = -1.0;
        for i in 0..50 {
            let v = tone_map(Vec3::splat(i as f32 * 0.5), 1.0).x;
            assert!((0.0..1.0).contains(&v) || v == 1.0);
            assert!(v >= previous);
            previous = v;
        }
        assert_eq!(tone_map(Vec3::splat(-3.0), 1.0), Vec3::ZERO);
    }

    #[test]
    fn test_srgb_endpoints() {
        assert_eq!(linear_to_srgb(0.0), 0.0);
        assert!((linear_to_srgb(1.0) - 1.0).abs() < 1e-5);
        assert!(linear_to_srgb(0.2) > 0.2);
    }

    #[test]
    fn test_render_day_frame() {
        let config = small_config(12.0);
        let mut renderer = Renderer::new(&config).unwrap();
        let frame = renderer.frame();
        assert!(frame.cloud_map.is_some());
        let scene = Scene::new(&frame, &config.fog);
        let image = render(&scene, Projection::Equirectangular, 24, 12, 2);
        assert_eq!(image.pixels.len(), 24 * 12);
        for pixel in &image.pixels {
            assert!(pixel.is_finite() && pixel.min_element() >= 0.0, "{pixel:?}");
            assert_eq!(pixel.w, 1.0);
        }
        let bytes = image.to_rgba8(config.sky.exposure);
        assert_eq!(bytes.len(), 24 * 12 * 4);
    }

    #[test]
    fn test_night_darker_than_day() {
        let brightness = |hour: f64| {
            let config = small_config(hour);
            let mut renderer = Renderer::new(&config).unwrap();
            let frame = renderer.frame();
            let scene = Scene::new(&frame, &config.fog);
            let image = render(&scene, Projection::Fisheye, 16, 16, 1);
            image
                .pixels
                .iter()
                .map(|p| p.truncate().element_sum())
                .sum::<f32>()
        };
        let day = brightness(12.0);
        let night = brightness(0.0);
        assert!(night < day * 0.05, "night {night} vs day {day}");
    }

    #[test]
    fn test_export_luts_writes_every_table() {
        let tmp = tempfile::tempdir().unwrap();
        let mut renderer = Renderer::new(&small_config(9.0)).unwrap();
        let written = renderer.frame().export_luts(tmp.path()).unwrap();
        assert_eq!(written.len(), 6);
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_frozen_clock_reuses_sky_view() {
        let config = small_config(9.0);
        assert_eq!(config.celestial.day_duration_seconds, 0.0);
        let mut renderer = Renderer::new(&config).unwrap();
        let first = renderer.frame().celestial.julian_day;
        for _ in 0..3 {
            renderer.advance(60.0);
            assert_eq!(renderer.frame().celestial.julian_day, first);
        }
        assert_eq!(renderer.local_hour(), 9.0);
        assert_eq!(renderer.sky_view_rebuilds(), 1);
    }

    #[test]
    fn test_running_clock_moves_sun_and_rebuilds_sky_view() {
        let mut config = small_config(6.0);
        // One simulated hour per ten real seconds.
        config.celestial.day_duration_seconds = 240.0;
        let mut renderer = Renderer::new(&config).unwrap();
        let morning = renderer.frame().celestial.julian_day;

        renderer.advance(60.0);
        assert!((renderer.local_hour() - 12.0).abs() < 1e-9);
        let frame = renderer.frame();
        assert!((frame.celestial.julian_day - morning - 0.25).abs() < 1e-6);
        assert!((frame.time_s - 12.0 * 3600.0).abs() < 1.0);
        assert_eq!(renderer.sky_view_rebuilds(), 2);

        // Past midnight the date rolls over instead of wrapping back.
        renderer.advance(150.0);
        assert!((renderer.local_hour() - 27.0).abs() < 1e-9);
        let next_day = renderer.frame().celestial.julian_day;
        assert!((next_day - morning - 21.0 / 24.0).abs() < 1e-6);
    }

    #[test]
    fn test_sky_view_thresholds_come_from_config() {
        let mut config = small_config(10.0);
        config.celestial.day_duration_seconds = 240.0;
        // Cosine and illuminance changes can never exceed this.
        config.sky.sky_view_direction_threshold = 2.0;
        let mut renderer = Renderer::new(&config).unwrap();
        renderer.frame();
        renderer.advance(40.0);
        renderer.frame();
        assert_eq!(renderer.sky_view_rebuilds(), 1);

        config.sky.sky_view_direction_threshold = SkyConfig::default().sky_view_direction_threshold;
        let mut tight = Renderer::new(&config).unwrap();
        tight.frame();
        tight.advance(40.0);
        tight.frame();
        assert_eq!(tight.sky_view_rebuilds(), 2);
    }

    #[test]
    fn test_frame_path_numbers_sequences() {
        let single = frame_path(Path::new("out/sky.png"), 0, 1);
        assert_eq!(single, PathBuf::from("out/sky.png"));
        let third = frame_path(Path::new("out/sky.png"), 2, 10);
        assert_eq!(third, PathBuf::from("out/sky_0002.png"));
        assert_eq!(frame_path(Path::new("sky"), 7, 8), PathBuf::from("sky_0007"));
    }
}
