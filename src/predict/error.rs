use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Satellite ({0}) has no orbital elements")]
    MissingElements(u32),
    #[error("Invalid orbital elements: {0}")]
    InvalidElements(String),
    #[error("Propagation error: {0}")]
    Propagation(String),
    #[error("Prediction request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Prediction service returned HTTP {0}")]
    Status(u16),
    #[error("Invalid prediction response: {0}")]
    InvalidResponse(String),
    #[error("Predictor not configured: {0}")]
    NotConfigured(String),
    #[error("Prediction timed out")]
    Timeout,
}
