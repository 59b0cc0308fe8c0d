use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompassError {
    /// Sample with a non-finite component or no horizontal field.
    #[error("invalid magnetometer sample (x: {x}, y: {y})")]
    InvalidSample { x: f32, y: f32 },

    #[error("declination model failed: {0}")]
    Declination(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T, E = CompassError> = std::result::Result<T, E>;
