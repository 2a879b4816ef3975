#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Malformed annotation: {0}")]
    MalformedAnnotation(String),

    #[error("Surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Raster error: {0}")]
    Raster(#[from] image::ImageError),
}
