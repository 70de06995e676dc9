//! Error types for the editor. Every variant states *where* things went wrong.

use thiserror::Error;

/// Result type alias for editor operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Creating or updating the window failed.
    #[error("window error: {0}")]
    Window(String),

    /// The labeling server could not be reached or the transfer failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered, but not with what we asked for.
    #[error("server error: {0}")]
    Server(String),

    /// Decoding or encoding raster bytes failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The server's JSON did not match the expected shape.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
