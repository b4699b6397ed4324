//! Configuration system for skylight.
//!
//! Runtime-configurable settings persisted to disk as RON. Supports CLI
//! overrides via clap, hot-reload detection, and forward/backward compatible
//! serialization (every section falls back to its defaults).

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AtmosphereConfig, CONFIG_FILE_NAME, CelestialConfig, CloudConfig, CloudStyle, Config,
    DebugConfig, FogConfig, Projection, RenderConfig, SkyConfig,
};
pub use error::ConfigError;
