use thiserror::Error;

/// Unified error type for the helper layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Division by zero: percentage base must be non-zero")]
    DivisionByZero,

    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<figment::Error> for CoreError {
    fn from(err: figment::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}
