//! Volumetric clouds in a spherical shell above the planet.
//!
//! [`CloudLayer`] describes the shell, [`CloudNoise`] the fractal density,
//! [`CloudMap`] an optional per-frame paraboloid map of the sky, and
//! [`CloudRenderer`] marches view rays through it all using the lookup
//! tables of an [`skylight_atmosphere::AtmosphereModel`] for lighting.

mod cloud_map;
mod cloud_noise;
mod layer;
mod march;

pub use cloud_map::{CLOUD_MAP_SIZE, CloudMap, paraboloid_decode, paraboloid_encode};
pub use cloud_noise::{CloudNoise, FbmParams};
pub use layer::{CLOUD_EXTINCTION_PER_KM, CloudDensity, CloudLayer, height_gradient};
pub use march::{CloudRenderer, CloudResult, DENSITY_THRESHOLD, MIN_TRANSMITTANCE};
