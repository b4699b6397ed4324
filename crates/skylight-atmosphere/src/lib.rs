//! Precomputed atmospheric scattering.
//!
//! Static tables (transmittance, multiple scattering, irradiance) depend on
//! [`AtmosphereParams`] only and live in [`AtmosphereModel`]. The sky-view
//! table is rebuilt per frame from the celestial state; [`SkyRenderer`]
//! turns it into final sky radiance and [`AerialPerspective`] tints scene
//! geometry.

mod aerial;
mod error;
mod export;
mod integrate;
mod irradiance;
mod lut;
mod mapping;
mod medium;
mod model;
mod multiscatter;
mod params;
mod sky;
mod sky_view;
mod transmittance;

pub use aerial::{AerialPerspective, FogResult, HeightFog};
pub use error::{AtmosphereError, ExportError};
pub use export::{
    encode_png, export_sky_view, export_static_luts, lut_to_rgba8, write_lut_png, write_rgba_png,
};
pub use integrate::{LightSource, ScatteringResult, ScatteringTables, integrate_scattering};
pub use irradiance::{IRRADIANCE_HEIGHT, IRRADIANCE_WIDTH, IrradianceLuts, compute_irradiance};
pub use lut::{
    Lut2D, Texel, fill_rows, texel_center, texel_coord_to_unit, unit_to_texel_coord, worker_count,
};
pub use mapping::{SunAltitudeMapping, TransmittanceMapping};
pub use medium::{
    ISOTROPIC_PHASE, MediumSample, RayExit, advance, cornette_shanks_phase, distance_to_boundary,
    distance_to_ground, distance_to_top, exponential_density, henyey_greenstein_phase,
    horizon_cosine, integrate_step, ozone_density, ray_hits_ground, rayleigh_phase, sample_medium,
};
pub use model::AtmosphereModel;
pub use multiscatter::{MULTISCATTER_SIZE, MultiScatterLut, compute_multiscatter};
pub use params::AtmosphereParams;
pub use sky::{SkyComponents, SkyRenderer, SkySettings};
pub use sky_view::{
    SKY_VIEW_HEIGHT, SKY_VIEW_WIDTH, SkyViewCache, SkyViewLut, decode_direction, encode_direction,
};
pub use transmittance::{
    TRANSMITTANCE_HEIGHT, TRANSMITTANCE_STEPS, TRANSMITTANCE_WIDTH, TransmittanceLut,
    compute_transmittance,
};
