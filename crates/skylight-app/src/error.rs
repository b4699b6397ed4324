//! Top-level error type of the skylight binary.

use skylight_atmosphere::{AtmosphereError, ExportError};
use skylight_config::ConfigError;

use crate::platform::PlatformError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("atmosphere setup failed: {0}")]
    Atmosphere(#[from] AtmosphereError),

    #[error("image export failed: {0}")]
    Export(#[from] ExportError),

    #[error("output directory could not be created: {0}")]
    Io(#[from] std::io::Error),
}
