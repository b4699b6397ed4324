//! End-to-end sky scenarios: full static tables, a sky-view table for the
//! frame and the runtime reconstructor.

use glam::Vec3;
use skylight_atmosphere::{
    AerialPerspective, AtmosphereModel, AtmosphereParams, SkyRenderer, SkySettings, SkyViewCache,
};
use skylight_celestial::{CelestialSettings, CelestialState, solar_disc};
use skylight_config::{FogConfig, SkyConfig};

const JULIAN_DAY: f64 = 2460483.0;
const CAMERA_ALTITUDE_KM: f32 = 0.2;

fn model() -> AtmosphereModel {
    AtmosphereModel::new(AtmosphereParams::earth(), 0).unwrap()
}

fn direction_with_height(y: f32) -> Vec3 {
    Vec3::new(0.0, y, (1.0 - y * y).sqrt())
}

#[test]
fn test_scenario_a_noon_zenith_is_blue() {
    let model = model();
    let sun = direction_with_height(0.5);
    let moon = Vec3::new(0.3, -0.6, -0.74).normalize();
    let state = CelestialState::from_directions(sun, moon, JULIAN_DAY, &CelestialSettings::default());
    let sky_view = model.build_sky_view(CAMERA_ALTITUDE_KM, &state);
    let settings = SkySettings::default();
    let renderer = SkyRenderer::new(&model, &sky_view, &state, &settings);

    let components = renderer.components(Vec3::Y);
    let l = components.total();
    assert!(l.z > l.y && l.y > l.x, "zenith radiance not blue: {l:?}");
    assert!(l.z > 2.0 * l.x, "zenith blue should dominate red: {l:?}");
    assert_eq!(components.moon, Vec3::ZERO);
    assert_eq!(components.stars, Vec3::ZERO);
    assert_eq!(components.night_floor, Vec3::ZERO);
}

#[test]
fn test_scenario_b_deep_night_is_floor_plus_stars() {
    let model = model();
    let sun = direction_with_height(-0.2);
    let moon = Vec3::new(0.2, -0.4, -0.89).normalize();
    let state = CelestialState::from_directions(sun, moon, JULIAN_DAY, &CelestialSettings::default());
    let sky_view = model.build_sky_view(CAMERA_ALTITUDE_KM, &state);
    let config = SkyConfig {
        star_density: 0.5,
        ..SkyConfig::default()
    };
    let settings = SkySettings::from_config(&config, 51.5);
    let renderer = SkyRenderer::new(&model, &sky_view, &state, &settings);

    let floor = settings.night_floor * state.star_visibility;
    assert_eq!(state.star_visibility, 1.0);
    for i in 0..400 {
        let azimuth = i as f32 * 0.157;
        let elevation = 0.2 + 1.2 * (i as f32 / 400.0);
        let dir = skylight_math::direction_from_angles(elevation, azimuth);
        let c = renderer.components(dir);
        assert_eq!(c.scattered, Vec3::ZERO, "no sun or moon light in the sky");
        assert_eq!(c.halo, Vec3::ZERO);
        assert_eq!(c.sun, Vec3::ZERO);
        assert_eq!(c.moon, Vec3::ZERO);
        assert_eq!(c.night_floor, floor);
        let expected = floor + c.stars;
        assert!((renderer.radiance(dir) - expected).length() < 1e-7);
    }
    let zenith = renderer.components(Vec3::Y);
    assert!((zenith.total() - (floor + zenith.stars)).length() < 1e-7);
}

#[test]
fn test_scenario_c_total_eclipse_shows_corona() {
    let model = model();
    let sun = direction_with_height(0.6);
    let settings = CelestialSettings {
        eclipse_amount: 1.0,
        ..CelestialSettings::default()
    };
    let state = CelestialState::from_directions(sun, -Vec3::Y, JULIAN_DAY, &settings);

    let disc = solar_disc(sun, sun, state.eclipse_amount, &state.disc);
    assert!(disc.disc < 1e-3, "photosphere hidden, got {}", disc.disc);
    assert!(disc.corona > 0.0);

    let sky_view = model.build_sky_view(CAMERA_ALTITUDE_KM, &state);
    let sky = SkySettings::default();
    let renderer = SkyRenderer::new(&model, &sky_view, &state, &sky);
    let at_sun = renderer.components(sun);
    assert!(at_sun.sun.min_element() > 0.0, "corona glows: {:?}", at_sun.sun);

    let uneclipsed = CelestialState::from_directions(
        sun,
        -Vec3::Y,
        JULIAN_DAY,
        &CelestialSettings::default(),
    );
    let clear_view = model.build_sky_view(CAMERA_ALTITUDE_KM, &uneclipsed);
    let clear = SkyRenderer::new(&model, &clear_view, &uneclipsed, &sky).components(sun);
    assert!(clear.sun.x > 10.0 * at_sun.sun.x);
    assert!(clear.scattered.y > at_sun.scattered.y, "eclipse darkens the sky");
}

#[test]
fn test_sky_view_cache_rebuilds_on_change_only() {
    let model = model();
    let settings = CelestialSettings::default();
    let state = CelestialState::from_directions(
        direction_with_height(0.4),
        -Vec3::Y,
        JULIAN_DAY,
        &settings,
    );
    let mut cache = SkyViewCache::new(1e-4, 0.05);
    cache.update(&model, 0.2, &state);
    cache.update(&model, 0.2, &state);
    cache.update(&model, 0.21, &state);
    assert_eq!(cache.rebuilds(), 1);

    let moved = CelestialState::from_directions(
        direction_with_height(0.3),
        -Vec3::Y,
        JULIAN_DAY,
        &settings,
    );
    let lut = cache.update(&model, 0.2, &moved);
    assert_eq!(lut.camera_altitude(), 0.2);
    assert_eq!(cache.rebuilds(), 2);

    cache.update(&model, 1.0, &moved);
    assert_eq!(cache.rebuilds(), 3);
}

#[test]
fn test_aerial_perspective_fades_distant_geometry() {
    let model = model();
    let state = CelestialState::from_directions(
        direction_with_height(0.5),
        -Vec3::Y,
        JULIAN_DAY,
        &CelestialSettings::default(),
    );
    let fog = FogConfig::default();
    let aerial = AerialPerspective::new(&model, &state, &fog, Vec3::splat(1e-3));
    let camera = Vec3::new(0.0, 200.0, 0.0);
    let grass = Vec3::new(0.05, 0.2, 0.03);

    let near = aerial.apply(grass, camera, Vec3::new(50.0, 0.0, 0.0), 1.0);
    let far = aerial.apply(grass, camera, Vec3::new(18_000.0, 0.0, 0.0), 1.0);
    assert!((near - grass).length() < (far - grass).length());
    // Distant terrain takes on the colour of the lit haze, not the grass.
    assert!(far.z / far.y > grass.z / grass.y);
}
