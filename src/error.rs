use thiserror::Error;

/// Chain analytics error types.
///
/// Analyzers never fail on sparse data; these are raised only when a
/// collaborator hands over input that breaks the snapshot contract, or when
/// configuration and history I/O go wrong.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Invalid strike: {0}")]
    InvalidStrike(String),

    #[error("Duplicate strike: {0}")]
    DuplicateStrike(f64),

    #[error("Negative open interest {oi} at strike {strike} ({leg})")]
    NegativeOpenInterest { strike: f64, leg: &'static str, oi: i64 },

    #[error("Invalid IV {iv} at strike {strike} ({leg})")]
    InvalidIv { strike: f64, leg: &'static str, iv: f64 },

    #[error("Invalid spot price: {0}")]
    InvalidSpot(f64),

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChainError>;
