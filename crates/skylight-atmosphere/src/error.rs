//! Atmosphere error types.

/// Errors raised when constructing an atmosphere model.
#[derive(Debug, thiserror::Error)]
pub enum AtmosphereError {
    /// A physical parameter violates its invariant.
    #[error("invalid atmosphere parameter `{field}`: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: &'static str,
    },
}

/// Errors raised while writing lookup tables to disk.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write LUT image: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode PNG: {0}")]
    Encoding(#[from] png::EncodingError),
}
