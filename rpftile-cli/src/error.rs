//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the terminal by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid command-line input.
    #[error("{0}")]
    Usage(String),

    /// Dataset discovery produced nothing usable.
    #[error("{0}")]
    Dataset(String),

    /// I/O error reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame file failed to load or decode.
    #[error(transparent)]
    Decode(#[from] rpftile::frame::DecodeError),

    /// Writing the output image failed.
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}
