use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriorityValidationError {
    #[error("Invalid priority {0}, must be non-negative")]
    Negative(i64),

    #[error("Invalid priority {0}, must be at most {max}", max = u32::MAX)]
    TooLarge(i128),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeoutValidationError {
    #[error("Invalid timeout, must be a finite number of seconds")]
    NotFinite,

    #[error("Invalid timeout {0}s, must be non-negative")]
    Negative(f64),

    #[error("Invalid timeout {0}s, too large to be represented")]
    TooLarge(f64),
}
